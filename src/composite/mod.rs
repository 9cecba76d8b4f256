//! How one image is drawn at one point in time.
//!
//! This is the single drawing contract shared by the editor canvas, playback preview and export:
//! all of them turn [`crate::ImageRecord`]s into [`ImageDraw`]s through [`image_draw`] and collect
//! them in a [`FramePlan`].

/// Per-image draw instructions and focal geometry.
pub mod draw;
/// World bounds, hit testing and click-to-focal mapping.
pub mod hit;
/// Ordered draw lists for one output frame.
pub mod plan;
