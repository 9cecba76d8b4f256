//! Focal-point alignment: translate images so every marked focal point lands on one world anchor.

/// Alignment solver and its result.
pub mod solver;
