use std::{
    io::{Read, Write as _},
    process::{Child, ChildStdin, Command, Stdio},
    sync::mpsc::{Receiver, SyncSender, TrySendError},
    thread::JoinHandle,
    time::Duration,
};

use crate::{
    encode::sink::{EncodeDeadline, EncoderConfig, FrameEncoder},
    foundation::{
        core::FrameIndex,
        error::{FocalError, FocalResult},
        math::flatten_premul_over_bg_to_opaque_rgba8,
    },
    render::backend::FrameRGBA,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Frames buffered between `push_frame` and the stdin writer thread.
const FRAME_QUEUE: usize = 2;

/// Video codecs tried in order of preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoCodec {
    /// H.264 in fragmented MP4.
    H264Mp4,
    /// VP9 in WebM.
    Vp9Webm,
}

impl VideoCodec {
    /// Order in which codecs are tried.
    pub const PREFERENCE: [VideoCodec; 2] = [VideoCodec::H264Mp4, VideoCodec::Vp9Webm];

    /// ffmpeg encoder name.
    pub fn encoder_name(self) -> &'static str {
        match self {
            Self::H264Mp4 => "libx264",
            Self::Vp9Webm => "libvpx-vp9",
        }
    }

    /// Container file extension.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::H264Mp4 => "mp4",
            Self::Vp9Webm => "webm",
        }
    }

    /// Container MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::H264Mp4 => "video/mp4",
            Self::Vp9Webm => "video/webm",
        }
    }

    fn output_args(self) -> &'static [&'static str] {
        match self {
            // Fragmented MP4 so the muxer never needs to seek back into stdout.
            Self::H264Mp4 => &[
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "frag_keyframe+empty_moov+default_base_moof",
                "-f",
                "mp4",
            ],
            Self::Vp9Webm => &[
                "-c:v",
                "libvpx-vp9",
                "-pix_fmt",
                "yuv420p",
                "-b:v",
                "0",
                "-crf",
                "32",
                "-f",
                "webm",
            ],
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// First codec in [`VideoCodec::PREFERENCE`] that the local `ffmpeg` build can encode.
pub fn detect_codec() -> FocalResult<VideoCodec> {
    if !is_ffmpeg_on_path() {
        return Err(FocalError::encoder_unavailable(
            "ffmpeg is required for video export, but was not found on PATH",
        ));
    }
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| FocalError::encoder_unavailable(format!("failed to query ffmpeg encoders: {e}")))?;
    let listing = String::from_utf8_lossy(&output.stdout);
    select_codec(&listing).ok_or_else(|| {
        FocalError::encoder_unavailable(
            "ffmpeg has neither libx264 nor libvpx-vp9; no video codec available",
        )
    })
}

/// Pick the preferred codec present in an `ffmpeg -encoders` listing.
pub(crate) fn select_codec(listing: &str) -> Option<VideoCodec> {
    VideoCodec::PREFERENCE.into_iter().find(|codec| {
        listing
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(codec.encoder_name()))
    })
}

/// Video encoder that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// The container is read back from ffmpeg's stdout, so nothing touches the file system. Frames
/// are written by a dedicated thread behind a bounded queue; `push_frame` never blocks on the
/// pipe past the time limit and fails as soon as ffmpeg exits early.
pub struct VideoEncoder {
    codec: Option<VideoCodec>,
    time_limit: Option<Duration>,
    child: Option<Child>,
    frames: Option<SyncSender<Vec<u8>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    stdout_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    deadline: Option<EncodeDeadline>,
    cfg: Option<EncoderConfig>,
    last_idx: Option<FrameIndex>,
}

impl VideoEncoder {
    /// Encoder that detects a codec in `begin`.
    pub fn new() -> Self {
        Self {
            codec: None,
            time_limit: None,
            child: None,
            frames: None,
            writer: None,
            stdout_drain: None,
            stderr_drain: None,
            deadline: None,
            cfg: None,
            last_idx: None,
        }
    }

    /// Skip codec detection and use `codec` (still fails in `begin` if ffmpeg cannot run).
    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Bound the time frame writes may wait on ffmpeg, counted from `begin`.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Codec chosen in `begin` (or forced via [`VideoEncoder::with_codec`]).
    pub fn codec(&self) -> Option<VideoCodec> {
        self.codec
    }

    fn start(&mut self, mut cmd: Command, cfg: EncoderConfig) -> FocalResult<()> {
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| {
            FocalError::encoder_unavailable(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FocalError::encoding_failed("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FocalError::encoding_failed("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FocalError::encoding_failed("failed to open ffmpeg stderr (unexpected)"))?;

        let (tx, rx) = std::sync::mpsc::sync_channel(FRAME_QUEUE);
        self.writer = Some(write_frames(stdin, rx));
        self.frames = Some(tx);
        self.stdout_drain = Some(drain(stdout));
        self.stderr_drain = Some(drain(stderr));
        self.child = Some(child);
        self.deadline = self.time_limit.map(EncodeDeadline::new);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    /// Hand one flattened frame to the writer thread, waiting for queue space.
    fn enqueue(&mut self, mut frame: Vec<u8>) -> FocalResult<()> {
        loop {
            let sent = match self.frames.as_ref() {
                Some(tx) => tx.try_send(frame),
                None => {
                    return Err(FocalError::encoding_failed("ffmpeg encoder is already finalized"));
                }
            };
            match sent {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(back)) => frame = back,
                Err(TrySendError::Disconnected(_)) => return Err(self.writer_failure()),
            }
            self.ensure_running()?;
            let wait = match self.deadline {
                Some(deadline) if deadline.expired() => {
                    tracing::warn!("ffmpeg stopped accepting frames before the export deadline");
                    self.kill();
                    return Err(deadline.timeout_error());
                }
                Some(deadline) => POLL_INTERVAL.min(deadline.remaining()),
                None => POLL_INTERVAL,
            };
            std::thread::sleep(wait);
        }
    }

    /// Fail with ffmpeg's diagnostics if the process has already exited.
    fn ensure_running(&mut self) -> FocalResult<()> {
        let polled = match self.child.as_mut() {
            Some(child) => child.try_wait(),
            None => return Err(FocalError::encoding_failed("ffmpeg encoder not started")),
        };
        match polled {
            Ok(None) => Ok(()),
            Ok(Some(status)) => {
                self.child = None;
                let stderr = join_drain(self.stderr_drain.take(), "stderr").unwrap_or_default();
                self.kill();
                Err(FocalError::encoding_failed(format!(
                    "ffmpeg exited early with status {}: {}",
                    status,
                    String::from_utf8_lossy(&stderr).trim()
                )))
            }
            Err(e) => {
                self.kill();
                Err(FocalError::encoding_failed(format!("failed to poll ffmpeg: {e}")))
            }
        }
    }

    fn writer_failure(&mut self) -> FocalError {
        let err = match join_writer(self.writer.take()) {
            Ok(()) => FocalError::encoding_failed("ffmpeg stdin writer stopped unexpectedly"),
            Err(e) => e,
        };
        self.kill();
        err
    }

    fn kill(&mut self) {
        drop(self.frames.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("ffmpeg kill: {e}");
            }
            let _ = child.wait();
        }
        if let Some(h) = self.writer.take() {
            let _ = h.join();
        }
        if let Some(h) = self.stdout_drain.take() {
            let _ = h.join();
        }
        if let Some(h) = self.stderr_drain.take() {
            let _ = h.join();
        }
    }
}

impl Default for VideoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        self.kill();
    }
}

impl FrameEncoder for VideoEncoder {
    fn file_extension(&self) -> &'static str {
        self.codec.unwrap_or(VideoCodec::H264Mp4).file_extension()
    }

    fn mime_type(&self) -> &'static str {
        self.codec.unwrap_or(VideoCodec::H264Mp4).mime_type()
    }

    fn begin(&mut self, cfg: EncoderConfig) -> FocalResult<()> {
        cfg.validate()?;
        self.kill();

        let codec = match self.codec {
            Some(c) if is_ffmpeg_on_path() => c,
            Some(_) => {
                return Err(FocalError::encoder_unavailable(
                    "ffmpeg is required for video export, but was not found on PATH",
                ));
            }
            None => detect_codec()?,
        };
        self.codec = Some(codec);

        let mut cmd = Command::new("ffmpeg");
        // Input: raw RGBA8, flattened to opaque in push_frame since ffmpeg does not understand
        // premultiplied alpha.
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}", cfg.fps),
            "-i",
            "pipe:0",
            "-an",
        ]);
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            // yuv420p needs even dimensions.
            cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"]);
        }
        cmd.args(codec.output_args()).arg("pipe:1");

        tracing::debug!(?codec, width = cfg.width, height = cfg.height, fps = cfg.fps, "starting ffmpeg");
        self.start(cmd, cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, _delay_ms: u32) -> FocalResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| FocalError::encoding_failed("ffmpeg encoder not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(FocalError::encoding_failed(
                "ffmpeg encoder received out-of-order frame index",
            ));
        }
        cfg.check_frame(frame)?;
        self.last_idx = Some(idx);

        let mut opaque = vec![0u8; frame.data.len()];
        flatten_premul_over_bg_to_opaque_rgba8(&mut opaque, &frame.data, cfg.background)?;

        self.ensure_running()?;
        self.enqueue(opaque)
    }

    fn finish(
        &mut self,
        deadline: &EncodeDeadline,
        progress: &mut dyn FnMut(f64),
    ) -> FocalResult<Vec<u8>> {
        drop(self.frames.take());
        let status = loop {
            let polled = match self.child.as_mut() {
                Some(child) => child.try_wait(),
                None => return Err(FocalError::encoding_failed("ffmpeg encoder not started")),
            };
            match polled {
                Ok(Some(status)) => break status,
                Ok(None) if deadline.expired() => {
                    tracing::warn!("ffmpeg did not finish before the export deadline; killing it");
                    self.kill();
                    return Err(deadline.timeout_error());
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL.min(deadline.remaining())),
                Err(e) => {
                    self.kill();
                    return Err(FocalError::encoding_failed(format!(
                        "failed to wait for ffmpeg to finish: {e}"
                    )));
                }
            }
        };
        self.child = None;
        progress(0.9);

        let written = join_writer(self.writer.take());
        let stdout = join_drain(self.stdout_drain.take(), "stdout")?;
        let stderr = join_drain(self.stderr_drain.take(), "stderr")?;
        self.cfg = None;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(FocalError::encoding_failed(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        written?;
        if stdout.is_empty() {
            return Err(FocalError::encoding_failed("ffmpeg produced no output"));
        }
        progress(1.0);
        Ok(stdout)
    }

    fn abort(&mut self) {
        self.kill();
        self.cfg = None;
    }
}

fn drain(mut src: impl Read + Send + 'static) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        src.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn write_frames(mut stdin: ChildStdin, frames: Receiver<Vec<u8>>) -> JoinHandle<std::io::Result<()>> {
    std::thread::spawn(move || {
        for frame in frames {
            stdin.write_all(&frame)?;
        }
        stdin.flush()
    })
}

fn join_writer(handle: Option<JoinHandle<std::io::Result<()>>>) -> FocalResult<()> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| FocalError::encoding_failed("ffmpeg stdin writer thread panicked"))?
            .map_err(|e| FocalError::encoding_failed(format!("failed to write frame to ffmpeg stdin: {e}"))),
        None => Ok(()),
    }
}

fn join_drain(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    what: &str,
) -> FocalResult<Vec<u8>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| FocalError::encoding_failed(format!("ffmpeg {what} drain thread panicked")))?
            .map_err(|e| FocalError::encoding_failed(format!("ffmpeg {what} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
