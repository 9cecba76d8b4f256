use crate::{
    config::engine::ZoomLimits,
    foundation::{
        core::{Affine, Point, Rect, Size, Vec2},
        error::{FocalError, FocalResult},
    },
};

/// World-space camera of the interactive editor.
///
/// `origin` is the world point shown at the screen's top-left corner, so
/// `screen = (world - origin) * zoom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    origin: Point,
    zoom: f64,
    surface: Size,
    limits: ZoomLimits,
}

impl Viewport {
    /// Camera at the world origin, zoom 1.
    pub fn new(surface: Size, limits: ZoomLimits) -> Self {
        Self {
            origin: Point::ORIGIN,
            zoom: limits.clamp(1.0),
            surface,
            limits,
        }
    }

    /// World point at the screen's top-left corner.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Current zoom factor.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Surface size in pixels.
    pub fn surface(&self) -> Size {
        self.surface
    }

    /// Map a world point to screen pixels.
    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.origin.x) * self.zoom,
            (p.y - self.origin.y) * self.zoom,
        )
    }

    /// Map a screen pixel to world coordinates.
    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new(
            p.x / self.zoom + self.origin.x,
            p.y / self.zoom + self.origin.y,
        )
    }

    /// World-to-screen transform for renderers.
    pub fn to_affine(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(-self.origin.to_vec2())
    }

    /// World rectangle currently visible on the surface.
    pub fn visible_world_rect(&self) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ORIGIN),
            self.screen_to_world(Point::new(self.surface.width, self.surface.height)),
        )
    }

    /// Move the camera to show `origin` at the top-left corner.
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Pan by a screen-space drag delta (content follows the pointer).
    pub fn pan_by_screen(&mut self, delta: Vec2) {
        self.origin -= delta / self.zoom;
    }

    /// Set the zoom factor, keeping the world point under `anchor` (screen pixels) fixed.
    ///
    /// The requested zoom is clamped to the configured limits.
    pub fn zoom_at(&mut self, anchor: Point, zoom: f64) {
        let pivot = self.screen_to_world(anchor);
        self.zoom = self.limits.clamp(zoom);
        self.origin = Point::new(
            pivot.x - anchor.x / self.zoom,
            pivot.y - anchor.y / self.zoom,
        );
    }

    /// Multiply the zoom by `factor` around `anchor` (e.g. one wheel notch).
    pub fn zoom_by(&mut self, anchor: Point, factor: f64) {
        self.zoom_at(anchor, self.zoom * factor);
    }

    /// Track a surface resize. The world point at the top-left corner stays put.
    pub fn resize(&mut self, surface: Size) {
        self.surface = surface;
    }

    /// Frame `bounds` (plus `padding` world units on every side) in the centre of the surface.
    pub fn fit_to(&mut self, bounds: Rect, padding: f64) -> FocalResult<()> {
        let padded = bounds.inflate(padding, padding);
        if !(padded.width() > 0.0 && padded.height() > 0.0) {
            return Err(FocalError::validation("fit_to bounds must have positive area"));
        }
        if !(self.surface.width > 0.0 && self.surface.height > 0.0) {
            return Err(FocalError::validation("fit_to needs a non-empty surface"));
        }
        let zoom = (self.surface.width / padded.width()).min(self.surface.height / padded.height());
        self.zoom = self.limits.clamp(zoom);
        let center = padded.center();
        self.origin = Point::new(
            center.x - self.surface.width / (2.0 * self.zoom),
            center.y - self.surface.height / (2.0 * self.zoom),
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/camera.rs"]
mod tests;
