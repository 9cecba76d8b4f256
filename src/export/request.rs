use std::time::Duration;

use crate::{
    config::{animation::AnimationConfig, engine::EngineConfig},
    encode::{
        ffmpeg::VideoEncoder, gif::AnimatedGifEncoder, sequence::FrameSequenceEncoder,
        sink::FrameEncoder,
    },
    foundation::error::{FocalError, FocalResult},
};

/// Artifact encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Compressed raster video (MP4/H.264, WebM/VP9 fallback) via the system `ffmpeg`.
    Video,
    /// Looping animated GIF.
    AnimatedImage,
    /// ZIP of uncompressed per-frame PNGs plus a JSON manifest.
    FrameSequence,
}

impl ExportFormat {
    /// Parse a format name (case-insensitive). Accepts the encoding names as aliases.
    pub fn parse(name: &str) -> FocalResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "video" | "mp4" | "webm" => Ok(Self::Video),
            "animated_image" | "animated-image" | "gif" => Ok(Self::AnimatedImage),
            "frame_sequence" | "frame-sequence" | "frames" | "zip" => Ok(Self::FrameSequence),
            other => Err(FocalError::validation(format!(
                "unknown export format '{other}'"
            ))),
        }
    }
}

/// Build the encoder for `format`.
pub fn create_encoder(format: ExportFormat, cfg: &EngineConfig) -> Box<dyn FrameEncoder> {
    match format {
        ExportFormat::Video => Box::new(
            VideoEncoder::new().with_time_limit(Duration::from_millis(cfg.export.timeout_ms)),
        ),
        ExportFormat::AnimatedImage => Box::new(AnimatedGifEncoder::new(
            cfg.export.animated_image_delay_floor_ms,
        )),
        ExportFormat::FrameSequence => Box::new(FrameSequenceEncoder::new()),
    }
}

/// What to export.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportRequest {
    /// Target encoding.
    pub format: ExportFormat,
    /// Playback settings the frames are generated with.
    pub animation: AnimationConfig,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Suggested file name without extension.
    #[serde(default = "default_stem")]
    pub file_stem: String,
}

fn default_stem() -> String {
    "focal-loop".to_owned()
}

impl ExportRequest {
    /// Request with the default file stem.
    pub fn new(format: ExportFormat, animation: AnimationConfig, width: u32, height: u32) -> Self {
        Self {
            format,
            animation,
            width,
            height,
            file_stem: default_stem(),
        }
    }
}

/// A finished export. The core never writes it anywhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Suggested file name including extension.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Frames pushed to the encoder.
    pub frame_count: u64,
    /// Per-frame delay that was requested from the encoder.
    pub frame_delay_ms: u32,
}
