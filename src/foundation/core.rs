use crate::foundation::error::{FocalError, FocalResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// 0-based index of one rendered animation frame (export frame counter).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Pixel dimensions of an output surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated, non-empty canvas.
    pub fn new(width: u32, height: u32) -> FocalResult<Self> {
        if width == 0 || height == 0 {
            return Err(FocalError::validation("canvas width/height must be non-zero"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(FocalError::validation(format!(
                "canvas {width}x{height} exceeds the {} px raster limit",
                u16::MAX
            )));
        }
        Ok(Self { width, height })
    }

    /// Canvas size as floating-point geometry.
    pub fn size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Number of bytes in a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}
