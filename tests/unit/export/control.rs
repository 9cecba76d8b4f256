use super::*;
use crate::{
    assets::Raster,
    config::animation::AnimationConfig,
    export::request::ExportFormat,
};

#[test]
fn reporter_is_monotonic_and_clamped() {
    let mut seen = Vec::new();
    {
        let mut sink = |p: f64| seen.push(p);
        let mut r = ProgressReporter::new(&mut sink);
        r.report(0.2);
        r.report(0.1);
        r.report(f64::NAN);
        r.report(0.2);
        r.report(7.0);
        assert_eq!(r.last(), Some(1.0));
    }
    assert_eq!(seen, vec![0.2, 1.0]);
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let a = CancelToken::new();
    let b = a.clone();
    assert!(!b.is_cancelled());
    a.cancel();
    assert!(b.is_cancelled());
}

fn two_images() -> ImageSet {
    let (set, _) = ImageSet::new(4)
        .with_raster(Raster::solid(6, 6, [255, 0, 0, 255]).unwrap(), 0)
        .unwrap();
    let (set, _) = set
        .with_raster(Raster::solid(6, 6, [0, 0, 255, 255]).unwrap(), 1)
        .unwrap();
    set
}

#[test]
fn spawned_export_streams_progress_and_returns_artifact() {
    let req = ExportRequest::new(
        ExportFormat::FrameSequence,
        AnimationConfig::default(),
        16,
        16,
    );
    let handle = spawn_export(two_images(), EngineConfig::default(), req).unwrap();
    let progress: Vec<f64> = handle.progress().iter().collect();
    let artifact = handle.wait().unwrap();
    assert_eq!(artifact.file_name, "focal-loop.zip");
    assert_eq!(artifact.frame_count, 2);
    assert_eq!(progress.last().copied(), Some(1.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn cancelled_before_start_reports_cancelled() {
    let req = ExportRequest::new(
        ExportFormat::FrameSequence,
        AnimationConfig::default(),
        16,
        16,
    );
    let set = two_images();
    let token = CancelToken::new();
    token.cancel();
    let err = export(&set, &EngineConfig::default(), &req, &token, &mut |_| {}).unwrap_err();
    assert!(matches!(err, FocalError::Cancelled));
}
