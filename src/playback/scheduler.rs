use std::time::Duration;

use crate::{
    composite::plan::FramePlan,
    foundation::error::FocalResult,
    model::set::ImageSet,
    playback::engine::{PlaybackEngine, PlaybackState},
};

/// Most ticks one host frame may catch up on; anything beyond is dropped.
pub const DEFAULT_MAX_CATCH_UP: u32 = 4;

/// Paces a [`PlaybackEngine`] from host per-frame callbacks.
///
/// The loop owns its own start/stop lifecycle and accumulated time; the host only reports how
/// much wall-clock time passed since its previous callback.
#[derive(Clone, Debug)]
pub struct PreviewLoop {
    engine: PlaybackEngine,
    running: bool,
    accumulated: Duration,
    max_catch_up: u32,
}

impl PreviewLoop {
    /// Stopped loop driving `engine`.
    pub fn new(engine: PlaybackEngine) -> Self {
        Self {
            engine,
            running: false,
            accumulated: Duration::ZERO,
            max_catch_up: DEFAULT_MAX_CATCH_UP,
        }
    }

    /// Cap the ticks run for one host frame (at least 1).
    pub fn with_max_catch_up(mut self, ticks: u32) -> Self {
        self.max_catch_up = ticks.max(1);
        self
    }

    /// The driven engine.
    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    /// The driven engine, mutably.
    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    /// `true` between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Tick period derived from the engine's frame rate.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.engine.animation().tick_ms() / 1000.0)
    }

    /// Start the loop. Returns `false` (and stays stopped) when the set is empty.
    pub fn start(&mut self, set: &ImageSet) -> bool {
        self.accumulated = Duration::ZERO;
        self.running = self.engine.play(set);
        self.running
    }

    /// Stop the loop and the engine; pending time is discarded.
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulated = Duration::ZERO;
        self.engine.stop();
    }

    /// Account for `elapsed` host time and return how many ticks are due now.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        let period = self.period();
        if period.is_zero() {
            return 0;
        }
        self.accumulated += elapsed;
        let mut due = 0;
        while self.accumulated >= period && due < self.max_catch_up {
            self.accumulated -= period;
            due += 1;
        }
        if self.accumulated >= period {
            tracing::trace!(dropped_ms = self.accumulated.as_millis() as u64, "preview fell behind");
            self.accumulated = Duration::ZERO;
        }
        due
    }

    /// Host per-frame callback: run due ticks against `set`, then return the current draw list.
    pub fn on_host_frame(
        &mut self,
        set: &ImageSet,
        elapsed: Duration,
    ) -> FocalResult<Option<FramePlan>> {
        for _ in 0..self.advance(elapsed) {
            self.engine.step(set);
        }
        if self.running && self.engine.state() == PlaybackState::Idle {
            self.running = false;
        }
        self.engine.frame(set)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
