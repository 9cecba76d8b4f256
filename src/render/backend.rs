use crate::{
    composite::plan::FramePlan,
    foundation::{error::FocalResult, math::unpremultiply_rgba8},
};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** by default; the flag makes that explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA8 of the pixel at `(x, y)`, `None` when outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if self.premultiplied {
            unpremultiply_rgba8(&self.data)
        } else {
            self.data.clone()
        }
    }
}

/// A renderer that turns a [`FramePlan`] into pixels.
///
/// Preview hosts and the export pipeline go through the same backend so both see identical
/// output for identical plans.
pub trait RenderBackend {
    /// Rasterize one plan.
    fn render(&mut self, plan: &FramePlan) -> FocalResult<FrameRGBA>;
}
