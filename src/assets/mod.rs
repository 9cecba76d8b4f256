//! Decoded image rasters.

/// Encoded-bytes decoding.
pub mod decode;

use std::sync::Arc;

use crate::foundation::error::{FocalError, FocalResult};

/// A decoded, immutable source raster.
///
/// Cloning is cheap; pixel storage is shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Raster {
    /// Wrap already-premultiplied RGBA8 pixels.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> FocalResult<Self> {
        if width == 0 || height == 0 {
            return Err(FocalError::validation("raster width/height must be non-zero"));
        }
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(FocalError::validation(format!(
                "raster byte length {} does not match {width}x{height} rgba8",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// A raster filled with one straight-alpha colour.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> FocalResult<Self> {
        let mut px = rgba.to_vec();
        crate::foundation::math::premultiply_rgba8_in_place(&mut px);
        let n = width as usize * height as usize;
        Self::from_premul_rgba8(width, height, px.repeat(n))
    }
}
