use std::io::{Cursor, Write as _};

use image::{ExtendedColorType, ImageEncoder as _, codecs::png::PngEncoder};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    encode::sink::{EncodeDeadline, EncoderConfig, FrameEncoder},
    foundation::{
        core::FrameIndex,
        error::{FocalError, FocalResult},
    },
    render::backend::FrameRGBA,
};

/// Name of the manifest entry inside the archive.
pub const MANIFEST_NAME: &str = "manifest.json";

/// Contents of `manifest.json`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceManifest {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Playback rate the frames were rendered at.
    pub fps: f64,
    /// Frames in display order.
    pub frames: Vec<ManifestFrame>,
}

/// One entry of [`SequenceManifest::frames`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestFrame {
    /// Archive entry name.
    pub file: String,
    /// Display duration.
    pub delay_ms: u32,
}

/// Uncompressed per-frame PNGs packaged in a stored (uncompressed) ZIP with a JSON manifest.
#[derive(Default)]
pub struct FrameSequenceEncoder {
    cfg: Option<EncoderConfig>,
    zip: Option<ZipWriter<Cursor<Vec<u8>>>>,
    manifest: Vec<ManifestFrame>,
    last_idx: Option<FrameIndex>,
}

impl FrameSequenceEncoder {
    /// Empty encoder; call `begin` before pushing frames.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Archive entry name for the frame at sequence position `n`.
pub fn frame_file_name(n: usize) -> String {
    format!("frame_{n:05}.png")
}

fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

fn zip_err(e: impl std::fmt::Display) -> FocalError {
    FocalError::encoding_failed(format!("frame sequence archive: {e}"))
}

impl FrameEncoder for FrameSequenceEncoder {
    fn file_extension(&self) -> &'static str {
        "zip"
    }

    fn mime_type(&self) -> &'static str {
        "application/zip"
    }

    fn begin(&mut self, cfg: EncoderConfig) -> FocalResult<()> {
        cfg.validate()?;
        self.zip = Some(ZipWriter::new(Cursor::new(Vec::new())));
        self.manifest.clear();
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, delay_ms: u32) -> FocalResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| FocalError::encoding_failed("frame sequence encoder not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(FocalError::encoding_failed(
                "frame sequence encoder received out-of-order frame index",
            ));
        }
        cfg.check_frame(frame)?;
        self.last_idx = Some(idx);

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                &frame.to_straight_rgba8(),
                frame.width,
                frame.height,
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| FocalError::encoding_failed(format!("png encode: {e}")))?;

        let zip = self
            .zip
            .as_mut()
            .ok_or_else(|| FocalError::encoding_failed("frame sequence encoder is finalized"))?;
        let name = frame_file_name(self.manifest.len());
        zip.start_file(name.as_str(), stored()).map_err(zip_err)?;
        zip.write_all(&png).map_err(zip_err)?;
        self.manifest.push(ManifestFrame {
            file: name,
            delay_ms,
        });
        Ok(())
    }

    fn finish(
        &mut self,
        deadline: &EncodeDeadline,
        progress: &mut dyn FnMut(f64),
    ) -> FocalResult<Vec<u8>> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| FocalError::encoding_failed("frame sequence encoder not started"))?;
        let mut zip = self
            .zip
            .take()
            .ok_or_else(|| FocalError::encoding_failed("frame sequence encoder not started"))?;
        deadline.check()?;

        let manifest = SequenceManifest {
            width: cfg.width,
            height: cfg.height,
            fps: cfg.fps,
            frames: std::mem::take(&mut self.manifest),
        };
        let json =
            serde_json::to_vec_pretty(&manifest).map_err(|e| FocalError::serde(e.to_string()))?;
        zip.start_file(MANIFEST_NAME, stored()).map_err(zip_err)?;
        zip.write_all(&json).map_err(zip_err)?;
        progress(0.5);

        let bytes = zip.finish().map_err(zip_err)?.into_inner();
        progress(1.0);
        Ok(bytes)
    }

    fn abort(&mut self) {
        self.zip = None;
        self.cfg = None;
        self.manifest.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sequence.rs"]
mod tests;
