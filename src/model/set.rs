use std::sync::Arc;

use crate::{
    assets::{Raster, decode::decode_image},
    foundation::{
        core::Size,
        error::{FocalError, FocalResult},
    },
    model::image::{ImageId, ImageRecord, Placement},
};

/// Versioned, immutable collection of [`ImageRecord`]s.
///
/// Every mutation returns a new snapshot; cloning a snapshot is an `Arc` bump, so playback and
/// export can hold a consistent view for a whole tick or run while the editor keeps editing.
#[derive(Clone, Debug)]
pub struct ImageSet {
    version: u64,
    next_id: u64,
    max_images: usize,
    records: Arc<Vec<ImageRecord>>,
}

impl Default for ImageSet {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ImageSet {
    /// Create an empty set accepting at most `max_images` records.
    pub fn new(max_images: usize) -> Self {
        Self {
            version: 0,
            next_id: 0,
            max_images: max_images.max(1),
            records: Arc::new(Vec::new()),
        }
    }

    /// Monotonic snapshot version; bumps on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the set has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Look up a record by id.
    pub fn get(&self, id: ImageId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records in animation order: temporal key ascending, ties by insertion order.
    pub fn sequence(&self) -> Vec<&ImageRecord> {
        let mut out: Vec<&ImageRecord> = self.records.iter().collect();
        out.sort_by_key(|r| r.sequence_key());
        out
    }

    /// Records in stacking order, bottom first: draw rank ascending, ties by insertion order.
    pub fn stacking(&self) -> Vec<&ImageRecord> {
        let mut out: Vec<&ImageRecord> = self.records.iter().collect();
        out.sort_by_key(|r| r.stacking_key());
        out
    }

    /// Decode `bytes` and append a new record on top of the stack.
    pub fn with_ingested(&self, bytes: &[u8], created_at: u64) -> FocalResult<(Self, ImageId)> {
        let raster = decode_image(bytes)?;
        let size = Size::new(f64::from(raster.width), f64::from(raster.height));
        self.with_record(Some(raster), size, created_at)
    }

    /// Append a record whose raster is already decoded.
    pub fn with_raster(&self, raster: Raster, created_at: u64) -> FocalResult<(Self, ImageId)> {
        let size = Size::new(f64::from(raster.width), f64::from(raster.height));
        self.with_record(Some(raster), size, created_at)
    }

    /// Append a record whose raster is still decoding. It is skipped by every draw until
    /// [`ImageSet::with_decoded`] supplies the raster.
    pub fn with_pending(&self, natural_size: Size, created_at: u64) -> FocalResult<(Self, ImageId)> {
        if !(natural_size.width > 0.0 && natural_size.height > 0.0) {
            return Err(FocalError::validation("natural size must be positive"));
        }
        self.with_record(None, natural_size, created_at)
    }

    /// Attach the decoded raster of a pending record.
    pub fn with_decoded(&self, id: ImageId, raster: Raster) -> FocalResult<Self> {
        let idx = self.index_of(id)?;
        let existing = &self.records[idx];
        if existing.raster.is_some() {
            return Err(FocalError::validation(format!(
                "image {id} already has a decoded raster"
            )));
        }
        let natural = Size::new(f64::from(raster.width), f64::from(raster.height));
        if natural != existing.natural_size {
            return Err(FocalError::validation(format!(
                "decoded raster {}x{} does not match the announced size of image {id}",
                raster.width, raster.height
            )));
        }
        let mut records = self.records.as_ref().clone();
        records[idx].raster = Some(raster);
        Ok(self.next_version(records))
    }

    /// Replace a whole record (editing-layer mutation).
    ///
    /// The source raster and natural size are immutable: they are taken from the stored record
    /// whatever the replacement carries.
    pub fn with_replaced(&self, record: ImageRecord) -> FocalResult<Self> {
        let idx = self.index_of(record.id)?;
        validate_record(&record)?;
        let mut records = self.records.as_ref().clone();
        let stored = &records[idx];
        let replacement = ImageRecord {
            raster: stored.raster.clone(),
            natural_size: stored.natural_size,
            ..record
        };
        records[idx] = replacement;
        Ok(self.next_version(records))
    }

    /// Remove a record, releasing this snapshot's handle on its raster.
    pub fn with_removed(&self, id: ImageId) -> FocalResult<Self> {
        let idx = self.index_of(id)?;
        let mut records = self.records.as_ref().clone();
        records.remove(idx);
        Ok(self.next_version(records))
    }

    fn with_record(
        &self,
        raster: Option<Raster>,
        natural_size: Size,
        created_at: u64,
    ) -> FocalResult<(Self, ImageId)> {
        if self.records.len() >= self.max_images {
            return Err(FocalError::validation(format!(
                "image limit reached ({} images)",
                self.max_images
            )));
        }
        let id = ImageId(self.next_id);
        let draw_rank = self
            .records
            .iter()
            .map(|r| r.draw_rank)
            .max()
            .map_or(0, |top| top.saturating_add(1));

        let mut records = self.records.as_ref().clone();
        records.push(ImageRecord {
            id,
            raster,
            natural_size,
            placement: Placement::default(),
            frame_zoom: None,
            frame_offset: None,
            focal_point: None,
            opacity: 1.0,
            draw_rank,
            created_at,
        });
        let mut next = self.next_version(records);
        next.next_id = self.next_id + 1;
        tracing::debug!(%id, created_at, version = next.version, "image ingested");
        Ok((next, id))
    }

    fn next_version(&self, records: Vec<ImageRecord>) -> Self {
        Self {
            version: self.version + 1,
            next_id: self.next_id,
            max_images: self.max_images,
            records: Arc::new(records),
        }
    }

    fn index_of(&self, id: ImageId) -> FocalResult<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| FocalError::validation(format!("unknown image {id}")))
    }
}

fn validate_record(r: &ImageRecord) -> FocalResult<()> {
    let p = r.placement;
    if !(p.position.x.is_finite() && p.position.y.is_finite() && p.rotation_rad.is_finite()) {
        return Err(FocalError::validation("placement must be finite"));
    }
    if !(p.scale.is_finite() && p.scale > 0.0) {
        return Err(FocalError::validation("placement scale must be finite and > 0"));
    }
    if let Some(z) = r.frame_zoom
        && !(z.is_finite() && z > 0.0)
    {
        return Err(FocalError::validation("frame zoom must be finite and > 0"));
    }
    if let Some(o) = r.frame_offset
        && !(o.x.is_finite() && o.y.is_finite())
    {
        return Err(FocalError::validation("frame offset must be finite"));
    }
    if let Some(fp) = r.focal_point
        && !(fp.x.is_finite() && fp.y.is_finite())
    {
        return Err(FocalError::validation("focal point must be finite"));
    }
    if !(0.0..=1.0).contains(&r.opacity) {
        return Err(FocalError::validation("opacity must be in [0, 1]"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/model/set.rs"]
mod tests;
