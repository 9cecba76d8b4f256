use crate::config::engine::EngineConfig;
use crate::foundation::error::{FocalError, FocalResult};

/// How consecutive sequence images hand over to each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Hard cut on every tick.
    #[default]
    None,
    /// Opacity crossfade.
    Fade,
    /// Opacity crossfade (alias kept for UI parity).
    Dissolve,
    /// Opacity crossfade (alias kept for UI parity).
    Blend,
}

impl TransitionKind {
    /// `true` unless this is [`TransitionKind::None`].
    pub fn is_enabled(self) -> bool {
        self != Self::None
    }
}

/// Parse a transition name (case-insensitive, surrounding whitespace ignored).
pub fn parse_transition(kind: &str) -> FocalResult<TransitionKind> {
    let kind = kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(FocalError::validation("transition kind must be non-empty"));
    }

    match kind.as_str() {
        "none" | "cut" => Ok(TransitionKind::None),
        "fade" | "crossfade" => Ok(TransitionKind::Fade),
        "dissolve" => Ok(TransitionKind::Dissolve),
        "blend" => Ok(TransitionKind::Blend),
        _ => Err(FocalError::validation(format!(
            "unknown transition kind '{kind}'"
        ))),
    }
}

/// Playback/export animation settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Frames per second; fractional rates are allowed.
    pub fps: f64,
    /// Transition between consecutive images.
    pub transition: TransitionKind,
    /// Transition length as a fraction of one frame interval.
    pub transition_duration: f64,
    /// Draw previous frames faintly beneath the current one.
    pub motion_trails: bool,
    /// Number of previous frames kept for trails (>= 1).
    pub trail_length: u32,
    /// Base opacity of trail frames.
    pub trail_opacity: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: 2.0,
            transition: TransitionKind::None,
            transition_duration: 0.5,
            motion_trails: false,
            trail_length: 3,
            trail_opacity: 0.5,
        }
    }
}

impl AnimationConfig {
    /// Clamp every field into the ranges allowed by `engine`.
    pub fn clamped(&self, engine: &EngineConfig) -> Self {
        Self {
            fps: engine.fps.clamp(self.fps, AnimationConfig::default().fps),
            transition: self.transition,
            transition_duration: clamp_unit(self.transition_duration),
            motion_trails: self.motion_trails,
            trail_length: self.trail_length.clamp(1, engine.max_trail_length.max(1)),
            trail_opacity: clamp_unit(self.trail_opacity),
        }
    }

    /// Scheduled tick period in milliseconds (`1000 / fps`), before any encoder floor.
    pub fn tick_ms(&self) -> f64 {
        1000.0 / self.fps
    }

    /// Sub-ticks a transition spans: `max(1, ceil(fps * transition_duration))`.
    ///
    /// Always 1 when no transition is configured.
    pub fn transition_steps(&self) -> u32 {
        if !self.transition.is_enabled() {
            return 1;
        }
        let steps = (self.fps * self.transition_duration).ceil();
        if steps.is_finite() && steps > 1.0 {
            steps.min(f64::from(u16::MAX)) as u32
        } else {
            1
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/config/animation.rs"]
mod tests;
