use crate::{
    assets::Raster,
    foundation::{
        core::{Affine, Point, Rect, Vec2},
        error::{FocalError, FocalResult},
    },
    model::image::{ImageId, ImageRecord},
};

/// Per-draw options resolved from the engine configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawOptions {
    /// Lower bound applied to an image's internal frame zoom.
    pub min_frame_zoom: f64,
    /// Emit focal-point markers (editor/preview only, never export).
    pub focal_markers: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            min_frame_zoom: 0.1,
            focal_markers: false,
        }
    }
}

/// Internal frame zoom/offset with defaults applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedFraming {
    /// Raster zoom inside the frame (>= the configured lower bound).
    pub zoom: f64,
    /// Raster shift inside the frame, frame-local pixels.
    pub offset: Vec2,
}

impl ResolvedFraming {
    /// Resolve the record's optional framing fields: zoom defaults to 1, offset to zero.
    pub fn resolve(record: &ImageRecord, min_zoom: f64) -> Self {
        let zoom = record
            .frame_zoom
            .filter(|z| z.is_finite())
            .unwrap_or(1.0)
            .max(min_zoom);
        let offset = record.frame_offset.unwrap_or(Vec2::ZERO);
        Self { zoom, offset }
    }
}

/// Image-pixel to frame-local transform: zoom about the image centre, then shift by the offset.
pub fn raster_to_frame(record: &ImageRecord, framing: ResolvedFraming) -> Affine {
    let half = record.natural_size.to_vec2() * 0.5;
    Affine::translate(half + framing.offset) * Affine::scale(framing.zoom) * Affine::translate(-half)
}

/// Frame-local position of an image-space point:
/// `frame_centre + (p - natural/2) * zoom + offset`.
pub fn image_to_frame_local(record: &ImageRecord, framing: ResolvedFraming, p: Point) -> Point {
    let half = record.natural_size.to_vec2() * 0.5;
    (half + (p.to_vec2() - half) * framing.zoom + framing.offset).to_point()
}

/// Inverse of [`image_to_frame_local`]: turn a frame-local click into an image-space point.
pub fn frame_local_to_image(record: &ImageRecord, framing: ResolvedFraming, local: Point) -> Point {
    let half = record.natural_size.to_vec2() * 0.5;
    (half + (local.to_vec2() - half - framing.offset) / framing.zoom).to_point()
}

/// World position of the record's focal point, if one is marked.
pub fn focal_world_point(record: &ImageRecord, min_zoom: f64) -> Option<Point> {
    let focal = record.focal_point?;
    let framing = ResolvedFraming::resolve(record, min_zoom);
    Some(record.placement.to_affine() * image_to_frame_local(record, framing, focal))
}

/// One image ready to rasterize.
///
/// Drawing is: transform by `frame_to_world`, clip to `clip`, paint `raster` through
/// `raster_to_frame`. `raster_rect` is the part of the clip the raster actually covers.
#[derive(Clone, Debug)]
pub struct ImageDraw {
    /// Which image this draw belongs to.
    pub id: ImageId,
    /// Source pixels.
    pub raster: Raster,
    /// Frame-local to world transform.
    pub frame_to_world: Affine,
    /// The frame in frame-local space (`[0, w] x [0, h]`).
    pub clip: Rect,
    /// Image-pixel to frame-local transform.
    pub raster_to_frame: Affine,
    /// Intersection of the clip with the raster's frame-local bounds (may be empty).
    pub raster_rect: Rect,
    /// Final opacity (record opacity times the time-varying multiplier).
    pub opacity: f64,
    /// Frame-local focal marker position, when markers are requested and a focal point exists.
    pub focal_marker: Option<Point>,
}

/// Build the draw instruction for `record` at opacity multiplier `alpha`.
///
/// Returns `Ok(None)` when the result would be invisible (no draw call at all) and
/// [`FocalError::DecodeSkipped`] when the raster is not decoded yet.
pub fn image_draw(
    record: &ImageRecord,
    alpha: f64,
    opts: &DrawOptions,
) -> FocalResult<Option<ImageDraw>> {
    if alpha.is_nan() || alpha <= 0.0 {
        return Ok(None);
    }
    let opacity = (record.opacity * alpha).clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(None);
    }
    let Some(raster) = record.raster.as_ref() else {
        return Err(FocalError::DecodeSkipped { id: record.id.0 });
    };

    let framing = ResolvedFraming::resolve(record, opts.min_frame_zoom);
    let raster_to_frame = raster_to_frame(record, framing);
    let clip = record.frame_rect();
    let raster_bounds = raster_to_frame.transform_rect_bbox(Rect::new(
        0.0,
        0.0,
        f64::from(raster.width),
        f64::from(raster.height),
    ));
    let raster_rect = clip.intersect(raster_bounds);

    let focal_marker = if opts.focal_markers {
        record
            .focal_point
            .map(|p| image_to_frame_local(record, framing, p))
    } else {
        None
    };

    Ok(Some(ImageDraw {
        id: record.id,
        raster: raster.clone(),
        frame_to_world: record.placement.to_affine(),
        clip,
        raster_to_frame,
        raster_rect,
        opacity,
        focal_marker,
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/composite/draw.rs"]
mod tests;
