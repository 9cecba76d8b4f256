use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::JoinHandle,
};

use image::{
    Delay, Frame, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};

use crate::{
    encode::sink::{EncodeDeadline, EncoderConfig, FrameEncoder},
    foundation::{
        core::FrameIndex,
        error::{FocalError, FocalResult},
    },
    render::backend::FrameRGBA,
};

/// Frames buffered between the render loop and the quantizing worker.
const QUEUE_DEPTH: usize = 4;
/// NeuQuant speed (1 = best quality, 30 = fastest).
const GIF_SPEED: i32 = 10;

struct FrameMsg {
    rgba: Vec<u8>,
    delay_ms: u32,
}

enum WorkerEvent {
    Encoded(u64),
    Done(FocalResult<Vec<u8>>),
}

struct Worker {
    tx: Option<mpsc::SyncSender<FrameMsg>>,
    events: mpsc::Receiver<WorkerEvent>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// Looping animated GIF encoder.
///
/// Palette quantization runs on a background worker fed through a bounded channel; the render
/// loop only converts pixels to straight alpha.
pub struct AnimatedGifEncoder {
    floor_ms: u32,
    cfg: Option<EncoderConfig>,
    worker: Option<Worker>,
    last_idx: Option<FrameIndex>,
}

impl AnimatedGifEncoder {
    /// Encoder whose per-frame delay never drops below `floor_ms`.
    pub fn new(floor_ms: u32) -> Self {
        Self {
            floor_ms,
            cfg: None,
            worker: None,
            last_idx: None,
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop.store(true, Ordering::SeqCst);
            drop(worker.tx.take());
            if let Some(handle) = worker.handle.take()
                && handle.join().is_err()
            {
                tracing::warn!("gif worker panicked during shutdown");
            }
        }
    }

    fn collect_failure(&mut self) -> FocalError {
        let Some(mut worker) = self.worker.take() else {
            return FocalError::encoding_failed("gif encoder is already finalized");
        };
        drop(worker.tx.take());
        let err = loop {
            match worker.events.recv() {
                Ok(WorkerEvent::Encoded(_)) => continue,
                Ok(WorkerEvent::Done(Err(e))) => break e,
                Ok(WorkerEvent::Done(Ok(_))) | Err(_) => {
                    break FocalError::encoding_failed("gif worker stopped accepting frames");
                }
            }
        };
        if let Some(handle) = worker.handle.take() {
            let _ = handle.join();
        }
        err
    }
}

impl Default for AnimatedGifEncoder {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Drop for AnimatedGifEncoder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl FrameEncoder for AnimatedGifEncoder {
    fn file_extension(&self) -> &'static str {
        "gif"
    }

    fn mime_type(&self) -> &'static str {
        "image/gif"
    }

    fn delay_floor_ms(&self) -> u32 {
        self.floor_ms
    }

    fn begin(&mut self, cfg: EncoderConfig) -> FocalResult<()> {
        cfg.validate()?;
        if cfg.width > u32::from(u16::MAX) || cfg.height > u32::from(u16::MAX) {
            return Err(FocalError::validation("gif width/height must fit in u16"));
        }
        self.shutdown();

        let (tx, rx) = mpsc::sync_channel::<FrameMsg>(QUEUE_DEPTH);
        let (ev_tx, events) = mpsc::channel::<WorkerEvent>();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let (width, height) = (cfg.width, cfg.height);

        let handle = std::thread::Builder::new()
            .name("focalloop-gif".into())
            .spawn(move || {
                let result = encode_worker(width, height, &rx, &worker_stop, &ev_tx);
                // The receiver may already be gone after an abort.
                let _ = ev_tx.send(WorkerEvent::Done(result));
            })
            .map_err(|e| FocalError::encoder_unavailable(format!("spawn gif worker: {e}")))?;

        self.worker = Some(Worker {
            tx: Some(tx),
            events,
            stop,
            handle: Some(handle),
        });
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, delay_ms: u32) -> FocalResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| FocalError::encoding_failed("gif encoder not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(FocalError::encoding_failed(
                "gif encoder received out-of-order frame index",
            ));
        }
        cfg.check_frame(frame)?;
        self.last_idx = Some(idx);

        let tx = self
            .worker
            .as_ref()
            .and_then(|w| w.tx.as_ref())
            .ok_or_else(|| FocalError::encoding_failed("gif encoder is already finalized"))?;
        let msg = FrameMsg {
            rgba: frame.to_straight_rgba8(),
            delay_ms: delay_ms.max(self.floor_ms),
        };
        if tx.send(msg).is_err() {
            // The worker only hangs up early on failure; surface its error.
            return Err(self.collect_failure());
        }
        Ok(())
    }

    fn finish(
        &mut self,
        deadline: &EncodeDeadline,
        progress: &mut dyn FnMut(f64),
    ) -> FocalResult<Vec<u8>> {
        let total = self
            .cfg
            .as_ref()
            .map_or(1, |c| c.frame_count)
            .max(1) as f64;
        let mut worker = self
            .worker
            .take()
            .ok_or_else(|| FocalError::encoding_failed("gif encoder not started"))?;
        drop(worker.tx.take());

        let outcome = loop {
            match worker.events.recv_timeout(deadline.remaining()) {
                Ok(WorkerEvent::Encoded(n)) => progress((n as f64 / total).min(1.0)),
                Ok(WorkerEvent::Done(result)) => break result,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    worker.stop.store(true, Ordering::SeqCst);
                    break Err(deadline.timeout_error());
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    break Err(FocalError::encoding_failed("gif worker exited unexpectedly"));
                }
            }
        };
        if let Some(handle) = worker.handle.take()
            && handle.join().is_err()
        {
            return Err(FocalError::encoding_failed("gif worker panicked"));
        }
        self.cfg = None;
        let bytes = outcome?;
        progress(1.0);
        Ok(bytes)
    }

    fn abort(&mut self) {
        self.shutdown();
        self.cfg = None;
    }
}

fn encode_worker(
    width: u32,
    height: u32,
    rx: &mpsc::Receiver<FrameMsg>,
    stop: &AtomicBool,
    events: &mpsc::Sender<WorkerEvent>,
) -> FocalResult<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, GIF_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| FocalError::encoding_failed(format!("gif set repeat: {e}")))?;

        let mut encoded = 0u64;
        while let Ok(msg) = rx.recv() {
            if stop.load(Ordering::SeqCst) {
                return Err(FocalError::Cancelled);
            }
            let img = RgbaImage::from_raw(width, height, msg.rgba)
                .ok_or_else(|| FocalError::encoding_failed("gif frame buffer size mismatch"))?;
            let frame = Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(msg.delay_ms, 1));
            encoder
                .encode_frame(frame)
                .map_err(|e| FocalError::encoding_failed(format!("gif encode frame: {e}")))?;
            encoded += 1;
            let _ = events.send(WorkerEvent::Encoded(encoded));
        }
        if stop.load(Ordering::SeqCst) {
            return Err(FocalError::Cancelled);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
