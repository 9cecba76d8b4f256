use std::collections::VecDeque;

use crate::model::image::ImageId;

/// Bounded history of previously shown images, most recent first.
#[derive(Clone, Debug)]
pub struct TrailHistory {
    entries: VecDeque<ImageId>,
    capacity: usize,
}

impl TrailHistory {
    /// Empty history holding at most `capacity` entries (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no image has been shown yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `id` as the most recent entry, evicting the oldest beyond capacity.
    pub fn push(&mut self, id: ImageId) {
        self.entries.push_front(id);
        self.entries.truncate(self.capacity);
    }

    /// Change the capacity; shrinking evicts the oldest entries.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.entries.truncate(self.capacity);
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `(rank, id)` pairs, rank 0 = most recent.
    pub fn ranked(&self) -> impl DoubleEndedIterator<Item = (usize, ImageId)> + '_ {
        self.entries.iter().copied().enumerate()
    }
}

/// Opacity of the trail entry at `rank`: `base * (rank + 1) / length * 0.5`.
pub fn trail_alpha(base: f64, rank: usize, length: usize) -> f64 {
    let length = length.max(1) as f64;
    (base * (rank as f64 + 1.0) / length * 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/trail.rs"]
mod tests;
