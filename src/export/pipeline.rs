use std::time::Duration;

use crate::{
    config::engine::EngineConfig,
    encode::sink::{EncodeDeadline, EncoderConfig, FrameEncoder},
    export::{
        control::{CancelToken, ProgressReporter},
        request::{Artifact, ExportRequest, create_encoder},
    },
    foundation::{
        core::{Canvas, FrameIndex},
        error::{FocalError, FocalResult},
    },
    model::set::ImageSet,
    playback::engine::PlaybackEngine,
    render::{backend::RenderBackend, cpu::CpuBackend},
};

/// Per-frame delay embedded by timed encodings: `round(1000 / fps)`, never below `floor_ms`.
pub fn frame_delay_ms(fps: f64, floor_ms: u32) -> u32 {
    let nominal = if fps.is_finite() && fps > 0.0 {
        (1000.0 / fps).round().clamp(1.0, f64::from(u32::MAX)) as u32
    } else {
        floor_ms.max(1)
    };
    nominal.max(floor_ms)
}

/// Export `set` with the encoder and CPU renderer matching `req.format`.
pub fn export(
    set: &ImageSet,
    cfg: &EngineConfig,
    req: &ExportRequest,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(f64),
) -> FocalResult<Artifact> {
    let mut encoder = create_encoder(req.format, cfg);
    let mut backend = CpuBackend::new();
    export_with_encoder(
        set,
        cfg,
        req,
        encoder.as_mut(),
        &mut backend,
        cancel,
        progress,
    )
}

/// Export through caller-supplied encoder and renderer.
///
/// Frames are produced by the same [`PlaybackEngine`] the preview uses, stepped once per frame
/// instead of by the clock. Any failure aborts the encoder and returns no artifact.
#[tracing::instrument(
    skip_all,
    fields(format = ?req.format, images = set.len(), width = req.width, height = req.height)
)]
pub fn export_with_encoder(
    set: &ImageSet,
    cfg: &EngineConfig,
    req: &ExportRequest,
    encoder: &mut dyn FrameEncoder,
    backend: &mut dyn RenderBackend,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(f64),
) -> FocalResult<Artifact> {
    let set = set.clone();
    if set.is_empty() {
        return Err(FocalError::validation("nothing to export: the image set is empty"));
    }
    let surface = Canvas::new(req.width, req.height)?;
    let mut engine = PlaybackEngine::new(cfg, &req.animation, surface);
    engine.play(&set);

    let fps = engine.animation().fps;
    let frame_count = set.len() as u64 * u64::from(engine.ticks_per_image(set.len()));
    let delay_ms = frame_delay_ms(fps, encoder.delay_floor_ms());
    let share = cfg.export.render_progress_share.clamp(0.0, 1.0);
    let deadline = EncodeDeadline::new(Duration::from_millis(cfg.export.timeout_ms));
    let mut reporter = ProgressReporter::new(progress);
    reporter.report(0.0);

    if cancel.is_cancelled() {
        return Err(FocalError::Cancelled);
    }
    encoder.begin(EncoderConfig {
        width: surface.width,
        height: surface.height,
        fps,
        frame_count,
        background: cfg.export.background_rgba,
    })?;
    tracing::debug!(frame_count, delay_ms, "encoder ready");

    let run = (|| -> FocalResult<Vec<u8>> {
        for i in 0..frame_count {
            if cancel.is_cancelled() {
                return Err(FocalError::Cancelled);
            }
            deadline.check()?;
            let plan = engine
                .frame(&set)?
                .ok_or_else(|| FocalError::validation("playback produced no frame"))?;
            let frame = backend.render(&plan)?;
            encoder.push_frame(FrameIndex(i), &frame, delay_ms)?;
            reporter.report(share * (i + 1) as f64 / frame_count as f64);
            engine.step(&set);
        }
        if cancel.is_cancelled() {
            return Err(FocalError::Cancelled);
        }
        let bytes = encoder.finish(&deadline, &mut |p| {
            reporter.report(share + (1.0 - share) * p.clamp(0.0, 1.0));
        })?;
        if cancel.is_cancelled() {
            return Err(FocalError::Cancelled);
        }
        Ok(bytes)
    })();

    let bytes = match run {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "export aborted");
            encoder.abort();
            return Err(e);
        }
    };
    reporter.report(1.0);

    let artifact = Artifact {
        file_name: format!("{}.{}", req.file_stem, encoder.file_extension()),
        mime_type: encoder.mime_type(),
        bytes,
        frame_count,
        frame_delay_ms: delay_ms,
    };
    tracing::info!(
        file = %artifact.file_name,
        bytes = artifact.bytes.len(),
        frames = frame_count,
        elapsed_ms = deadline.elapsed().as_millis() as u64,
        "export finished"
    );
    Ok(artifact)
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
