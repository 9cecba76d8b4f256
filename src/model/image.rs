use crate::{
    assets::Raster,
    foundation::core::{Affine, Point, Rect, Size, Vec2},
};

/// Stable identifier of one ingested image. Ids are assigned in arrival order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ImageId(pub u64);

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Placement of an image frame on the world canvas.
///
/// `position` is the world location of the frame's top-left corner; rotation and uniform scale
/// pivot on that corner.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    /// World position of the frame's top-left corner.
    pub position: Point,
    /// Uniform scale.
    pub scale: f64,
    /// Rotation in radians.
    pub rotation_rad: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            scale: 1.0,
            rotation_rad: 0.0,
        }
    }
}

impl Placement {
    /// Rotation and scale without the translation.
    pub fn linear(self) -> Affine {
        Affine::rotate(self.rotation_rad) * Affine::scale(self.scale)
    }

    /// Frame-local to world transform: `T(position) * R(rotation) * S(scale)`.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.position.to_vec2()) * self.linear()
    }
}

/// One photograph on the workspace.
///
/// Records are values: the editing layer replaces whole records inside an
/// [`crate::ImageSet`], the core only reads them.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRecord {
    /// Stable identifier.
    pub id: ImageId,
    /// Decoded source raster, `None` while decode is still pending.
    pub raster: Option<Raster>,
    /// Natural pixel dimensions; the frame is always this size.
    pub natural_size: Size,
    /// World placement of the frame.
    pub placement: Placement,
    /// Zoom of the raster inside its frame; `None` means 1.
    pub frame_zoom: Option<f64>,
    /// Shift of the raster inside its frame (frame-local pixels); `None` means zero.
    pub frame_offset: Option<Vec2>,
    /// User-marked focal point in natural image pixels.
    pub focal_point: Option<Point>,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Stacking rank; higher draws on top. Ties fall back to insertion order.
    pub draw_rank: i64,
    /// Temporal ordering key (creation timestamp); drives the animation sequence.
    pub created_at: u64,
}

impl ImageRecord {
    /// The frame rectangle in frame-local space, `[0, w] x [0, h]`.
    pub fn frame_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ORIGIN, self.natural_size)
    }

    /// `true` once the source raster is available for drawing.
    pub fn is_decoded(&self) -> bool {
        self.raster.is_some()
    }

    /// Sequence ordering key: temporal key, then insertion order.
    pub fn sequence_key(&self) -> (u64, ImageId) {
        (self.created_at, self.id)
    }

    /// Stacking ordering key: draw rank, then insertion order.
    pub fn stacking_key(&self) -> (i64, ImageId) {
        (self.draw_rank, self.id)
    }
}
