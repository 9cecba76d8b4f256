//! Shared primitives: geometry re-exports, error taxonomy, and pixel math.

/// Geometry re-exports and surface sizes.
pub mod core;
/// Error taxonomy.
pub mod error;
pub(crate) mod math;
