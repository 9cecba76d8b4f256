use super::*;
use crate::{
    assets::Raster,
    composite::plan::FramePlan,
    config::animation::{AnimationConfig, TransitionKind},
    encode::sink::InMemoryEncoder,
    export::request::ExportFormat,
    render::backend::FrameRGBA,
};

fn images(n: u64) -> ImageSet {
    let mut set = ImageSet::new(50);
    for i in 0..n {
        let (next, _) = set
            .with_raster(Raster::solid(8, 8, [(i * 40) as u8, 100, 200, 255]).unwrap(), i)
            .unwrap();
        set = next;
    }
    set
}

fn request(fps: f64) -> ExportRequest {
    ExportRequest::new(
        ExportFormat::AnimatedImage,
        AnimationConfig {
            fps,
            transition: TransitionKind::None,
            motion_trails: false,
            ..AnimationConfig::default()
        },
        32,
        24,
    )
}

#[derive(Default)]
struct CountingBackend {
    inner: CpuBackend,
    renders: usize,
}

impl RenderBackend for CountingBackend {
    fn render(&mut self, plan: &FramePlan) -> FocalResult<FrameRGBA> {
        self.renders += 1;
        self.inner.render(plan)
    }
}

/// Encoder with scripted failures.
#[derive(Default)]
struct Scripted {
    unavailable: bool,
    fail_on_push: Option<u64>,
    cancel_after_push: Option<CancelToken>,
    pushed: u64,
    aborted: bool,
}

impl FrameEncoder for Scripted {
    fn file_extension(&self) -> &'static str {
        "bin"
    }

    fn mime_type(&self) -> &'static str {
        "application/octet-stream"
    }

    fn begin(&mut self, _cfg: EncoderConfig) -> FocalResult<()> {
        if self.unavailable {
            return Err(FocalError::encoder_unavailable("no codec"));
        }
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA, _delay_ms: u32) -> FocalResult<()> {
        if self.fail_on_push == Some(idx.0) {
            return Err(FocalError::encoding_failed("codec exploded"));
        }
        self.pushed += 1;
        if let Some(token) = &self.cancel_after_push {
            token.cancel();
        }
        Ok(())
    }

    fn finish(
        &mut self,
        _deadline: &EncodeDeadline,
        progress: &mut dyn FnMut(f64),
    ) -> FocalResult<Vec<u8>> {
        progress(0.5);
        progress(1.0);
        Ok(vec![1, 2, 3])
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[test]
fn delay_is_rounded_and_floored() {
    assert_eq!(frame_delay_ms(24.0, 0), 42);
    assert_eq!(frame_delay_ms(24.0, 100), 100);
    assert_eq!(frame_delay_ms(60.0, 100), 100);
    assert_eq!(frame_delay_ms(5.0, 100), 200);
    assert_eq!(frame_delay_ms(0.5, 100), 2000);
}

#[test]
fn five_images_at_24fps_push_five_frames_of_42ms() {
    let set = images(5);
    let mut enc = InMemoryEncoder::new();
    let mut backend = CpuBackend::new();
    let mut seen = Vec::new();
    let artifact = export_with_encoder(
        &set,
        &EngineConfig::default(),
        &request(24.0),
        &mut enc,
        &mut backend,
        &CancelToken::new(),
        &mut |p| seen.push(p),
    )
    .unwrap();

    assert_eq!(enc.frames().len(), 5);
    assert!(enc.frames().iter().all(|f| f.delay_ms == 42));
    let idx: Vec<_> = enc.frames().iter().map(|f| f.idx.0).collect();
    assert_eq!(idx, vec![0, 1, 2, 3, 4]);
    assert_eq!(artifact.frame_count, 5);
    assert_eq!(artifact.frame_delay_ms, 42);
    assert_eq!(artifact.file_name, "focal-loop.rgba");

    assert_eq!(seen.first().copied(), Some(0.0));
    assert_eq!(seen.last().copied(), Some(1.0));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert!(seen.iter().all(|p| (0.0..=1.0).contains(p)));
    // Rendering stops at the configured share.
    assert!(seen.contains(&0.8));
}

#[test]
fn floor_limited_encoder_gets_100ms_above_10fps() {
    let set = images(3);
    let mut enc = InMemoryEncoder::new().with_delay_floor_ms(100);
    let artifact = export_with_encoder(
        &set,
        &EngineConfig::default(),
        &request(24.0),
        &mut enc,
        &mut CpuBackend::new(),
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(artifact.frame_delay_ms, 100);
    assert!(enc.frames().iter().all(|f| f.delay_ms == 100));
}

#[test]
fn transitions_multiply_the_frame_count() {
    let set = images(3);
    let mut req = request(4.0);
    req.animation.transition = TransitionKind::Blend;
    req.animation.transition_duration = 1.0;
    let mut enc = InMemoryEncoder::new();
    let artifact = export_with_encoder(
        &set,
        &EngineConfig::default(),
        &req,
        &mut enc,
        &mut CpuBackend::new(),
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(artifact.frame_count, 12);
    assert_eq!(enc.frames().len(), 12);
    assert!(enc.frames().iter().all(|f| f.delay_ms == 250));
}

#[test]
fn empty_set_is_rejected() {
    let err = export_with_encoder(
        &ImageSet::new(5),
        &EngineConfig::default(),
        &request(2.0),
        &mut InMemoryEncoder::new(),
        &mut CpuBackend::new(),
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, FocalError::Validation(_)));
}

#[test]
fn unavailable_encoder_fails_before_rendering() {
    let mut enc = Scripted {
        unavailable: true,
        ..Scripted::default()
    };
    let mut backend = CountingBackend::default();
    let err = export_with_encoder(
        &images(2),
        &EngineConfig::default(),
        &request(2.0),
        &mut enc,
        &mut backend,
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, FocalError::EncoderUnavailable(_)));
    assert!(err.is_retryable());
    assert_eq!(backend.renders, 0);
}

#[test]
fn encoder_failure_aborts_without_artifact() {
    let mut enc = Scripted {
        fail_on_push: Some(1),
        ..Scripted::default()
    };
    let err = export_with_encoder(
        &images(3),
        &EngineConfig::default(),
        &request(2.0),
        &mut enc,
        &mut CpuBackend::new(),
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, FocalError::EncodingFailed(_)));
    assert!(enc.aborted);
    assert_eq!(enc.pushed, 1);
}

#[test]
fn cancellation_stops_before_the_next_frame() {
    let token = CancelToken::new();
    let mut enc = Scripted {
        cancel_after_push: Some(token.clone()),
        ..Scripted::default()
    };
    let err = export_with_encoder(
        &images(4),
        &EngineConfig::default(),
        &request(2.0),
        &mut enc,
        &mut CpuBackend::new(),
        &token,
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, FocalError::Cancelled));
    assert_eq!(enc.pushed, 1);
    assert!(enc.aborted);
}

#[test]
fn zero_ceiling_times_out_and_aborts() {
    let mut cfg = EngineConfig::default();
    cfg.export.timeout_ms = 0;
    let mut enc = Scripted::default();
    let err = export_with_encoder(
        &images(2),
        &cfg,
        &request(2.0),
        &mut enc,
        &mut CpuBackend::new(),
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, FocalError::EncodingTimeout { limit_ms: 0, .. }));
    assert!(enc.aborted);
    assert_eq!(enc.pushed, 0);
}

#[test]
fn real_gif_export_produces_a_gif() {
    let artifact = export(
        &images(2),
        &EngineConfig::default(),
        &request(12.0),
        &CancelToken::new(),
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(artifact.file_name, "focal-loop.gif");
    assert_eq!(artifact.mime_type, "image/gif");
    assert_eq!(&artifact.bytes[..6], b"GIF89a");
}
