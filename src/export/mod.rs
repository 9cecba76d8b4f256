//! Offscreen export: walk the playback engine frame by frame, render each plan on the CPU and
//! feed an encoder, with progress, cancellation and a wall-clock ceiling.

/// Cancellation, progress and background exports.
pub mod control;
/// The export frame loop.
pub mod pipeline;
/// Export formats, requests and artifacts.
pub mod request;
