//! Frame encoders: animated GIF, video through the system `ffmpeg`, and zipped PNG sequences.

/// Video through the system `ffmpeg`.
pub mod ffmpeg;
/// Looping animated GIF.
pub mod gif;
/// Zipped PNG frame sequence.
pub mod sequence;
/// Encoder contract and the in-memory encoder.
pub mod sink;
