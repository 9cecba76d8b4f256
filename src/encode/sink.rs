use std::time::{Duration, Instant};

use crate::{
    foundation::{
        core::FrameIndex,
        error::{FocalError, FocalResult},
    },
    render::backend::FrameRGBA,
};

/// Configuration provided to a [`FrameEncoder`] before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Nominal frames per second (may be fractional).
    pub fps: f64,
    /// Total frames that will be pushed.
    pub frame_count: u64,
    /// Straight RGBA8 background used to flatten alpha where the format needs opaque pixels.
    pub background: [u8; 4],
}

impl EncoderConfig {
    /// Check dimensions, frame rate and frame count.
    pub fn validate(&self) -> FocalResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FocalError::validation("encode width/height must be non-zero"));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(FocalError::validation("encode fps must be finite and > 0"));
        }
        if self.frame_count == 0 {
            return Err(FocalError::validation("encode frame_count must be non-zero"));
        }
        Ok(())
    }

    pub(crate) fn check_frame(&self, frame: &FrameRGBA) -> FocalResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(FocalError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.data.len() != self.width as usize * self.height as usize * 4 {
            return Err(FocalError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }
}

/// Wall-clock ceiling shared by the render loop and the encoder's finalization.
#[derive(Clone, Copy, Debug)]
pub struct EncodeDeadline {
    start: Instant,
    limit: Duration,
}

impl EncodeDeadline {
    /// Start counting now.
    pub fn new(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    /// Time since the deadline was armed.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left before the ceiling (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    /// `true` once the ceiling has passed.
    pub fn expired(&self) -> bool {
        self.elapsed() >= self.limit
    }

    /// The [`FocalError::EncodingTimeout`] describing this deadline.
    pub fn timeout_error(&self) -> FocalError {
        FocalError::EncodingTimeout {
            elapsed_ms: self.elapsed().as_millis() as u64,
            limit_ms: self.limit.as_millis() as u64,
        }
    }

    /// `Err(timeout)` once expired.
    pub fn check(&self) -> FocalResult<()> {
        if self.expired() {
            Err(self.timeout_error())
        } else {
            Ok(())
        }
    }
}

/// Encoder contract for consuming rendered frames in sequence order.
///
/// Ordering contract: `push_frame` is called in strictly increasing [`FrameIndex`] order. After
/// [`FrameEncoder::abort`] no further frame is accepted.
pub trait FrameEncoder: Send {
    /// Suggested file extension of the finished artifact (no dot).
    fn file_extension(&self) -> &'static str;

    /// MIME type of the finished artifact.
    fn mime_type(&self) -> &'static str;

    /// Minimum per-frame delay the target players render reliably, `0` for none.
    fn delay_floor_ms(&self) -> u32 {
        0
    }

    /// Called once before any frame is pushed. Reports [`FocalError::EncoderUnavailable`] when
    /// the format cannot be produced on this platform.
    fn begin(&mut self, cfg: EncoderConfig) -> FocalResult<()>;

    /// Push one frame with its display duration.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, delay_ms: u32) -> FocalResult<()>;

    /// Flush and return the artifact bytes. `progress` receives the finalization fraction in
    /// `[0, 1]`; the encoder must stop and clean up once `deadline` expires.
    fn finish(
        &mut self,
        deadline: &EncodeDeadline,
        progress: &mut dyn FnMut(f64),
    ) -> FocalResult<Vec<u8>>;

    /// Stop immediately and release every resource; partial output is discarded.
    fn abort(&mut self);
}

/// One frame captured by [`InMemoryEncoder`].
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    /// Frame index as pushed.
    pub idx: FrameIndex,
    /// Display duration as pushed.
    pub delay_ms: u32,
    /// Copy of the pixels.
    pub frame: FrameRGBA,
}

/// In-memory encoder for tests and debugging.
///
/// The artifact is the concatenation of every pushed frame's pixels.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    floor_ms: u32,
    cfg: Option<EncoderConfig>,
    frames: Vec<CapturedFrame>,
    aborted: bool,
}

impl InMemoryEncoder {
    /// Encoder without a delay floor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a per-frame delay floor, like a real animated-image encoder would.
    pub fn with_delay_floor_ms(mut self, floor_ms: u32) -> Self {
        self.floor_ms = floor_ms;
        self
    }

    /// Configuration from the last `begin`.
    pub fn config(&self) -> Option<&EncoderConfig> {
        self.cfg.as_ref()
    }

    /// Frames pushed since the last `begin`.
    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    /// `true` after `abort`.
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameEncoder for InMemoryEncoder {
    fn file_extension(&self) -> &'static str {
        "rgba"
    }

    fn mime_type(&self) -> &'static str {
        "application/octet-stream"
    }

    fn delay_floor_ms(&self) -> u32 {
        self.floor_ms
    }

    fn begin(&mut self, cfg: EncoderConfig) -> FocalResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, delay_ms: u32) -> FocalResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| FocalError::encoding_failed("in-memory encoder not started"))?;
        if self.aborted {
            return Err(FocalError::encoding_failed("in-memory encoder was aborted"));
        }
        if let Some(last) = self.frames.last()
            && idx <= last.idx
        {
            return Err(FocalError::encoding_failed(
                "in-memory encoder received out-of-order frame index",
            ));
        }
        cfg.check_frame(frame)?;
        self.frames.push(CapturedFrame {
            idx,
            delay_ms,
            frame: frame.clone(),
        });
        Ok(())
    }

    fn finish(
        &mut self,
        deadline: &EncodeDeadline,
        progress: &mut dyn FnMut(f64),
    ) -> FocalResult<Vec<u8>> {
        deadline.check()?;
        let mut out = Vec::new();
        let total = self.frames.len().max(1) as f64;
        for (i, f) in self.frames.iter().enumerate() {
            out.extend_from_slice(&f.frame.data);
            progress((i + 1) as f64 / total);
        }
        Ok(out)
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
