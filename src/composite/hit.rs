use crate::{
    composite::draw::{ResolvedFraming, frame_local_to_image},
    foundation::core::{Point, Rect},
    model::{
        image::{ImageId, ImageRecord},
        set::ImageSet,
    },
    viewport::camera::Viewport,
};

/// World-space bounding box of the record's placed, scaled and rotated frame.
pub fn world_bounds(record: &ImageRecord) -> Rect {
    record
        .placement
        .to_affine()
        .transform_rect_bbox(record.frame_rect())
}

/// Union of [`world_bounds`] over every record, `None` for an empty slice.
pub fn union_bounds<'a>(records: impl IntoIterator<Item = &'a ImageRecord>) -> Option<Rect> {
    records
        .into_iter()
        .map(world_bounds)
        .reduce(|acc, r| acc.union(r))
}

/// Frame-local position of a world point, `None` when the point is outside the frame.
pub fn world_to_frame_local(record: &ImageRecord, world: Point) -> Option<Point> {
    let inv = record.placement.to_affine().inverse();
    let local = inv * world;
    let frame = record.frame_rect();
    let inside = local.x >= frame.x0 && local.x <= frame.x1 && local.y >= frame.y0 && local.y <= frame.y1;
    inside.then_some(local)
}

/// Topmost image (by stacking order) whose frame contains `world`.
pub fn hit_test(set: &ImageSet, world: Point) -> Option<ImageId> {
    set.stacking()
        .into_iter()
        .rev()
        .find(|r| r.opacity > 0.0 && world_to_frame_local(r, world).is_some())
        .map(|r| r.id)
}

/// Convert a screen click into an image-space focal coordinate for `record`.
///
/// Runs the viewport, placement and marker mappings in reverse; `None` when the click lands
/// outside the record's frame.
pub fn screen_to_focal(
    record: &ImageRecord,
    viewport: &Viewport,
    screen: Point,
    min_frame_zoom: f64,
) -> Option<Point> {
    let world = viewport.screen_to_world(screen);
    let local = world_to_frame_local(record, world)?;
    let framing = ResolvedFraming::resolve(record, min_frame_zoom);
    Some(frame_local_to_image(record, framing, local))
}

#[cfg(test)]
#[path = "../../tests/unit/composite/hit.rs"]
mod tests;
