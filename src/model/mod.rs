//! Image records and the versioned image set shared by editing, playback and export.

/// Single-image records.
pub mod image;
/// Versioned image set snapshots.
pub mod set;
