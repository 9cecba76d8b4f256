use crate::{
    composite::draw::{ResolvedFraming, focal_world_point, image_to_frame_local},
    foundation::{
        core::Point,
        error::{FocalError, FocalResult},
    },
    model::{image::ImageId, set::ImageSet},
};

/// Solved positions for every participating image.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentResult {
    /// Shared world anchor every focal point maps to.
    pub anchor: Point,
    /// The reference image (first participant in sequence order); its position is unchanged.
    pub reference: ImageId,
    /// New placement position per participant, in sequence order (reference included).
    pub positions: Vec<(ImageId, Point)>,
}

impl AlignmentResult {
    /// Apply the solved positions, returning a new snapshot. Scale, rotation and every
    /// non-participating image are left as they are.
    pub fn apply(&self, set: &ImageSet) -> FocalResult<ImageSet> {
        let mut out = set.clone();
        for &(id, position) in &self.positions {
            let Some(current) = out.get(id) else {
                return Err(FocalError::validation(format!(
                    "aligned image {id} is no longer in the set"
                )));
            };
            if current.placement.position == position {
                continue;
            }
            let mut record = current.clone();
            record.placement.position = position;
            out = out.with_replaced(record)?;
        }
        Ok(out)
    }
}

/// Solve the translation-only alignment of `set`.
///
/// Fails with [`FocalError::InsufficientAnchors`] when fewer than two images carry a focal point.
#[tracing::instrument(skip(set), fields(images = set.len(), version = set.version()))]
pub fn solve_alignment(set: &ImageSet, min_frame_zoom: f64) -> FocalResult<AlignmentResult> {
    let participants: Vec<_> = set
        .sequence()
        .into_iter()
        .filter(|r| r.focal_point.is_some())
        .collect();
    if participants.len() < 2 {
        return Err(FocalError::InsufficientAnchors {
            found: participants.len(),
        });
    }

    let reference = participants[0];
    let anchor = focal_world_point(reference, min_frame_zoom)
        .ok_or(FocalError::InsufficientAnchors { found: 0 })?;

    let mut positions = Vec::with_capacity(participants.len());
    positions.push((reference.id, reference.placement.position));
    for record in &participants[1..] {
        let Some(focal) = record.focal_point else {
            continue;
        };
        let framing = ResolvedFraming::resolve(record, min_frame_zoom);
        let local = image_to_frame_local(record, framing, focal);
        // position + linear * local == anchor
        let position = anchor - (record.placement.linear() * local).to_vec2();
        positions.push((record.id, position));
    }

    let reference = reference.id;
    tracing::debug!(%reference, ?anchor, participants = positions.len(), "alignment solved");
    Ok(AlignmentResult {
        anchor,
        reference,
        positions,
    })
}

/// Solve and apply in one step.
///
/// On [`FocalError::InsufficientAnchors`] the caller keeps its current snapshot; nothing is
/// changed.
pub fn align(set: &ImageSet, min_frame_zoom: f64) -> FocalResult<ImageSet> {
    solve_alignment(set, min_frame_zoom)?.apply(set)
}

#[cfg(test)]
#[path = "../../tests/unit/align/solver.rs"]
mod tests;
