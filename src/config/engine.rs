use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{FocalError, FocalResult};

/// Inclusive `[min, max]` range for a zoom factor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZoomLimits {
    /// Smallest allowed zoom.
    pub min: f64,
    /// Largest allowed zoom.
    pub max: f64,
}

impl ZoomLimits {
    /// Clamp `zoom` into the range. Non-finite input falls back to 1 (then clamped).
    ///
    /// Never panics: an unvalidated inverted range resolves to `max`, and a result that is not a
    /// positive finite zoom falls back to 1.
    pub fn clamp(self, zoom: f64) -> f64 {
        let z = if zoom.is_finite() { zoom } else { 1.0 };
        clamp_positive(z, self.min, self.max, 1.0)
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.1, max: 10.0 }
    }
}

/// Inclusive `[min, max]` frames-per-second range.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FpsLimits {
    /// Slowest allowed playback rate.
    pub min: f64,
    /// Fastest allowed playback rate.
    pub max: f64,
}

impl FpsLimits {
    /// Clamp `fps` into the range, with the same fallbacks as [`ZoomLimits::clamp`] (`fallback`
    /// instead of 1).
    pub fn clamp(self, fps: f64, fallback: f64) -> f64 {
        let f = if fps.is_finite() { fps } else { fallback };
        clamp_positive(f, self.min, self.max, fallback)
    }
}

impl Default for FpsLimits {
    fn default() -> Self {
        Self { min: 0.5, max: 60.0 }
    }
}

/// Export pipeline settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Wall-clock ceiling for a whole export run.
    pub timeout_ms: u64,
    /// Portion of the progress range consumed by frame rendering; the encoder's
    /// finalization reports into the remainder.
    pub render_progress_share: f64,
    /// Minimum per-frame delay for the animated-image encoding.
    pub animated_image_delay_floor_ms: u32,
    /// Background used behind images (straight RGBA8).
    pub background_rgba: [u8; 4],
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            render_progress_share: 0.8,
            animated_image_delay_floor_ms: 100,
            background_rgba: [0, 0, 0, 255],
        }
    }
}

/// Editor grid settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Distance between grid lines in world units.
    pub spacing: f64,
    /// Upper bound on lines generated per axis.
    pub max_lines: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            spacing: 50.0,
            max_lines: 4096,
        }
    }
}

/// Engine-wide configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of images held by one [`crate::ImageSet`].
    pub max_images: usize,
    /// Interactive viewport zoom range.
    pub viewport_zoom: ZoomLimits,
    /// Lower bound of the per-image internal frame zoom.
    pub min_frame_zoom: f64,
    /// Allowed playback rates.
    pub fps: FpsLimits,
    /// Longest motion-trail history.
    pub max_trail_length: u32,
    /// World-space padding added around all images when fitting playback/export.
    pub fit_padding: f64,
    /// Export settings.
    pub export: ExportSettings,
    /// Editor grid settings.
    pub grid: GridSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_images: 50,
            viewport_zoom: ZoomLimits::default(),
            min_frame_zoom: 0.1,
            fps: FpsLimits::default(),
            max_trail_length: 10,
            fit_padding: 50.0,
            export: ExportSettings::default(),
            grid: GridSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(s: &str) -> FocalResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| FocalError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> FocalResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Check ranges and invariants between fields.
    pub fn validate(&self) -> FocalResult<()> {
        if self.max_images == 0 {
            return Err(FocalError::validation("max_images must be >= 1"));
        }
        check_range("viewport_zoom", self.viewport_zoom.min, self.viewport_zoom.max)?;
        if !(self.min_frame_zoom.is_finite() && self.min_frame_zoom > 0.0) {
            return Err(FocalError::validation("min_frame_zoom must be finite and > 0"));
        }
        check_range("fps", self.fps.min, self.fps.max)?;
        if self.max_trail_length == 0 {
            return Err(FocalError::validation("max_trail_length must be >= 1"));
        }
        if !(self.fit_padding.is_finite() && self.fit_padding >= 0.0) {
            return Err(FocalError::validation("fit_padding must be finite and >= 0"));
        }
        if self.export.timeout_ms == 0 {
            return Err(FocalError::validation("export.timeout_ms must be > 0"));
        }
        let share = self.export.render_progress_share;
        if !(share.is_finite() && share > 0.0 && share <= 1.0) {
            return Err(FocalError::validation(
                "export.render_progress_share must be in (0, 1]",
            ));
        }
        if !(self.grid.spacing.is_finite() && self.grid.spacing > 0.0) {
            return Err(FocalError::validation("grid.spacing must be finite and > 0"));
        }
        if self.grid.max_lines < 2 {
            return Err(FocalError::validation("grid.max_lines must be >= 2"));
        }
        Ok(())
    }
}

/// `value` limited to `[min, max]` without `f64::clamp`'s panic on `min > max` or NaN bounds.
fn clamp_positive(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    let v = value.max(min).min(max);
    if v.is_finite() && v > 0.0 { v } else { fallback }
}

fn check_range(name: &str, min: f64, max: f64) -> FocalResult<()> {
    if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
        return Err(FocalError::validation(format!(
            "{name} range must satisfy 0 < min <= max (got {min}..{max})"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/config/engine.rs"]
mod tests;
