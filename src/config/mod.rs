//! Engine limits and animation settings.
//!
//! Both structures are plain serde data with defaults for every field, so a partial JSON
//! document is always a valid configuration once [`EngineConfig::validate`] passes.

/// Animation settings (fps, transitions, motion trails).
pub mod animation;
/// Engine-wide limits and export settings.
pub mod engine;
