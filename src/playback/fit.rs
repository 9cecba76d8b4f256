use crate::{
    composite::hit::union_bounds,
    foundation::core::{Affine, Rect, Size},
    model::image::ImageRecord,
};

/// Camera that shows every placed image on an output surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitViewport {
    /// World-to-surface transform.
    pub view: Affine,
    /// Uniform world-to-surface scale, never above 1.
    pub scale: f64,
    /// Padded world rectangle being framed.
    pub content: Rect,
}

/// Fit the padded union of all images' placed extents into `surface`, centred, without
/// upscaling. `None` when there is nothing to fit.
pub fn fit_viewport<'a>(
    records: impl IntoIterator<Item = &'a ImageRecord>,
    surface: Size,
    padding: f64,
) -> Option<FitViewport> {
    let content = union_bounds(records)?.inflate(padding, padding);
    if !(content.width() > 0.0 && content.height() > 0.0) {
        return None;
    }
    if !(surface.width > 0.0 && surface.height > 0.0) {
        return None;
    }
    let scale = (surface.width / content.width())
        .min(surface.height / content.height())
        .min(1.0);
    let view = Affine::translate((surface.width * 0.5, surface.height * 0.5))
        * Affine::scale(scale)
        * Affine::translate(-content.center().to_vec2());
    Some(FitViewport {
        view,
        scale,
        content,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/playback/fit.rs"]
mod tests;
