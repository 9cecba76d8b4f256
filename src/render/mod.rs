//! Rasterization of [`crate::FramePlan`]s.

/// Rendered frames and the backend trait.
pub mod backend;
/// `vello_cpu` backend.
pub mod cpu;
