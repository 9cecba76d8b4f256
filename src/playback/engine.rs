use crate::{
    composite::{draw::DrawOptions, plan::FramePlan},
    config::{animation::AnimationConfig, engine::EngineConfig},
    foundation::{core::Canvas, error::FocalResult},
    model::{image::ImageRecord, set::ImageSet},
    playback::{
        fit::{FitViewport, fit_viewport},
        trail::{TrailHistory, trail_alpha},
    },
};

/// Playback state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not playing; no frames are produced.
    Idle,
    /// Holding the current sequence position at full opacity.
    Playing,
    /// Blending into the next sequence position; `step` of `steps` sub-ticks done.
    Transitioning {
        /// Completed sub-ticks, `1..steps`.
        step: u32,
        /// Sub-ticks per transition.
        steps: u32,
    },
}

/// Clock-free playback engine.
///
/// One [`PlaybackEngine::step`] is one scheduled tick. The engine never owns the image list; every
/// call receives the snapshot to read from.
#[derive(Clone, Debug)]
pub struct PlaybackEngine {
    anim: AnimationConfig,
    min_frame_zoom: f64,
    fit_padding: f64,
    background: [u8; 4],
    surface: Canvas,
    focal_markers: bool,

    state: PlaybackState,
    index: usize,
    sub_step: u32,
    trail: TrailHistory,
}

impl PlaybackEngine {
    /// Create an idle engine rendering into `surface`. `anim` is clamped to `engine`'s limits.
    pub fn new(engine: &EngineConfig, anim: &AnimationConfig, surface: Canvas) -> Self {
        let anim = anim.clamped(engine);
        let trail = TrailHistory::new(anim.trail_length as usize);
        Self {
            anim,
            min_frame_zoom: engine.min_frame_zoom,
            fit_padding: engine.fit_padding,
            background: engine.export.background_rgba,
            surface,
            focal_markers: false,
            state: PlaybackState::Idle,
            index: 0,
            sub_step: 0,
            trail,
        }
    }

    /// Draw focal markers on top of each image (preview only; export never sets this).
    pub fn with_focal_markers(mut self, on: bool) -> Self {
        self.focal_markers = on;
        self
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Animation settings after clamping.
    pub fn animation(&self) -> &AnimationConfig {
        &self.anim
    }

    /// Output surface size.
    pub fn surface(&self) -> Canvas {
        self.surface
    }

    /// Current sequence position.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Blend factor toward the next position, `0` outside transitions.
    pub fn blend(&self) -> f64 {
        match self.state {
            PlaybackState::Transitioning { step, steps } => f64::from(step) / f64::from(steps),
            _ => 0.0,
        }
    }

    /// Number of history entries that would be eligible as trails.
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Start (or resume) playback. An empty set keeps the engine idle.
    pub fn play(&mut self, set: &ImageSet) -> bool {
        if set.is_empty() {
            tracing::debug!("play ignored: no images");
            self.state = PlaybackState::Idle;
            return false;
        }
        self.index %= set.len();
        self.sub_step = 0;
        self.state = PlaybackState::Playing;
        tracing::debug!(index = self.index, images = set.len(), "playback started");
        true
    }

    /// Stop playback, keeping the position.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
        self.sub_step = 0;
    }

    /// Return to the first sequence position and forget trails.
    pub fn rewind(&mut self) {
        self.index = 0;
        self.sub_step = 0;
        self.trail.clear();
        if self.state != PlaybackState::Idle {
            self.state = PlaybackState::Playing;
        }
    }

    /// Replace the animation settings. Position is kept; an in-flight transition restarts.
    pub fn set_animation(&mut self, engine: &EngineConfig, anim: &AnimationConfig) {
        self.anim = anim.clamped(engine);
        self.trail.set_capacity(self.anim.trail_length as usize);
        self.sub_step = 0;
        if matches!(self.state, PlaybackState::Transitioning { .. }) {
            self.state = PlaybackState::Playing;
        }
    }

    /// Track an output-surface resize. The fitting viewport follows on the next frame; the
    /// playback position does not move.
    pub fn resize(&mut self, surface: Canvas) {
        self.surface = surface;
    }

    /// Sub-ticks one sequence position lasts for a set of `len` images.
    pub fn ticks_per_image(&self, len: usize) -> u32 {
        if len < 2 {
            1
        } else {
            self.anim.transition_steps()
        }
    }

    /// Advance one scheduled tick. Returns `true` when the sequence position changed.
    pub fn step(&mut self, set: &ImageSet) -> bool {
        if self.state == PlaybackState::Idle {
            return false;
        }
        let len = set.len();
        if len == 0 {
            tracing::debug!("images removed during playback; going idle");
            self.state = PlaybackState::Idle;
            return false;
        }
        self.index %= len;

        let steps = self.ticks_per_image(len);
        self.sub_step += 1;
        if self.sub_step < steps {
            self.state = PlaybackState::Transitioning {
                step: self.sub_step,
                steps,
            };
            return false;
        }

        let sequence = set.sequence();
        self.trail.push(sequence[self.index].id);
        self.index = (self.index + 1) % len;
        self.sub_step = 0;
        self.state = PlaybackState::Playing;
        tracing::trace!(index = self.index, "advanced");
        true
    }

    /// Fitting viewport for the current surface.
    pub fn fit(&self, set: &ImageSet) -> Option<FitViewport> {
        fit_viewport(set.records(), self.surface.size(), self.fit_padding)
    }

    /// Draw list for the current state, `None` while idle or when there is nothing to draw.
    pub fn frame(&self, set: &ImageSet) -> FocalResult<Option<FramePlan>> {
        if self.state == PlaybackState::Idle || set.is_empty() {
            return Ok(None);
        }
        let Some(fit) = self.fit(set) else {
            return Ok(None);
        };
        let sequence = set.sequence();
        let len = sequence.len();
        let current = sequence[self.index % len];
        let opts = DrawOptions {
            min_frame_zoom: self.min_frame_zoom,
            focal_markers: self.focal_markers,
        };
        let mut plan = FramePlan::new(self.surface, fit.view, self.background);

        let blend = self.blend();
        if blend > 0.0 {
            let incoming = sequence[(self.index + 1) % len];
            let mut pair: [(&ImageRecord, f64); 2] = [(current, 1.0 - blend), (incoming, blend)];
            pair.sort_by_key(|(r, _)| r.stacking_key());
            for (record, alpha) in pair {
                plan.push(record, alpha, &opts)?;
            }
            return Ok(Some(plan));
        }

        if self.anim.motion_trails {
            let length = self.anim.trail_length as usize;
            for (rank, id) in self.trail.ranked().rev() {
                if id == current.id {
                    continue;
                }
                let Some(record) = set.get(id) else {
                    continue;
                };
                plan.push(
                    record,
                    trail_alpha(self.anim.trail_opacity, rank, length),
                    &opts,
                )?;
            }
        }
        plan.push(current, 1.0, &opts)?;
        Ok(Some(plan))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/engine.rs"]
mod tests;
