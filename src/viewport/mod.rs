//! Interactive world/screen mapping and the editor grid.

/// Pan/zoom camera.
pub mod camera;
/// Editor grid lines.
pub mod grid;
