use crate::{
    composite::draw::{DrawOptions, ImageDraw, image_draw},
    foundation::{
        core::{Affine, Canvas},
        error::{FocalError, FocalResult},
    },
    model::{image::ImageRecord, set::ImageSet},
    viewport::camera::Viewport,
};

/// Everything a rasterizer needs to produce one output frame.
///
/// Draws are ordered bottom to top.
#[derive(Clone, Debug)]
pub struct FramePlan {
    /// Output surface in pixels.
    pub surface: Canvas,
    /// World-to-surface transform.
    pub view: Affine,
    /// Straight RGBA8 fill behind every draw.
    pub background: [u8; 4],
    /// Image draws, bottom first.
    pub draws: Vec<ImageDraw>,
}

impl FramePlan {
    /// An empty plan (background only).
    pub fn new(surface: Canvas, view: Affine, background: [u8; 4]) -> Self {
        Self {
            surface,
            view,
            background,
            draws: Vec::new(),
        }
    }

    /// Append `record` at opacity multiplier `alpha`.
    ///
    /// Invisible draws are dropped and not-yet-decoded images are skipped with a trace log;
    /// only real failures propagate.
    pub fn push(&mut self, record: &ImageRecord, alpha: f64, opts: &DrawOptions) -> FocalResult<()> {
        match image_draw(record, alpha, opts) {
            Ok(Some(draw)) => self.draws.push(draw),
            Ok(None) => {}
            Err(FocalError::DecodeSkipped { id }) => {
                tracing::trace!(id, "draw skipped: raster still decoding");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Editor canvas: every image in stacking order through the interactive viewport, with focal
/// markers.
pub fn canvas_plan(
    set: &ImageSet,
    viewport: &Viewport,
    surface: Canvas,
    min_frame_zoom: f64,
    background: [u8; 4],
) -> FocalResult<FramePlan> {
    let opts = DrawOptions {
        min_frame_zoom,
        focal_markers: true,
    };
    let mut plan = FramePlan::new(surface, viewport.to_affine(), background);
    for record in set.stacking() {
        plan.push(record, 1.0, &opts)?;
    }
    Ok(plan)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/plan.rs"]
mod tests;
