//! Animation playback: sequence order, transitions, motion trails and the preview loop.
//!
//! [`PlaybackEngine`](engine::PlaybackEngine) is clock-free; [`PreviewLoop`](scheduler::PreviewLoop)
//! paces it from host frame callbacks and the export pipeline drives it with a frame counter.

/// Clock-free playback state machine.
pub mod engine;
/// Fit-all viewport for playback and export.
pub mod fit;
/// Host-paced preview loop.
pub mod scheduler;
/// Motion-trail history.
pub mod trail;
