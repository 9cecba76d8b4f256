use super::*;
use crate::{
    assets::Raster,
    config::{animation::AnimationConfig, engine::EngineConfig},
    foundation::core::Canvas,
};

fn preview(fps: f64) -> PreviewLoop {
    let anim = AnimationConfig {
        fps,
        ..AnimationConfig::default()
    };
    PreviewLoop::new(PlaybackEngine::new(
        &EngineConfig::default(),
        &anim,
        Canvas::new(16, 16).unwrap(),
    ))
}

fn two_images() -> ImageSet {
    let set = ImageSet::new(4);
    let (set, _) = set
        .with_raster(Raster::solid(4, 4, [255, 0, 0, 255]).unwrap(), 0)
        .unwrap();
    let (set, _) = set
        .with_raster(Raster::solid(4, 4, [0, 255, 0, 255]).unwrap(), 1)
        .unwrap();
    set
}

#[test]
fn ticks_follow_accumulated_time() {
    let set = two_images();
    let mut p = preview(10.0);
    assert!(p.start(&set));
    assert_eq!(p.advance(Duration::from_millis(60)), 0);
    assert_eq!(p.advance(Duration::from_millis(60)), 1);
    assert_eq!(p.advance(Duration::from_millis(180)), 2);
}

#[test]
fn catch_up_is_bounded() {
    let set = two_images();
    let mut p = preview(10.0).with_max_catch_up(2);
    p.start(&set);
    assert_eq!(p.advance(Duration::from_secs(5)), 2);
    assert_eq!(p.advance(Duration::from_millis(50)), 0);
}

#[test]
fn stopped_loop_does_not_tick() {
    let set = two_images();
    let mut p = preview(10.0);
    assert_eq!(p.advance(Duration::from_secs(1)), 0);
    p.start(&set);
    p.stop();
    assert!(!p.is_running());
    assert!(p.on_host_frame(&set, Duration::from_secs(1)).unwrap().is_none());
}

#[test]
fn host_frames_drive_the_engine() {
    let set = two_images();
    let mut p = preview(2.0);
    p.start(&set);
    let first = p.on_host_frame(&set, Duration::from_millis(16)).unwrap().unwrap();
    assert_eq!(p.engine().current_index(), 0);
    let later = p.on_host_frame(&set, Duration::from_millis(500)).unwrap().unwrap();
    assert_eq!(p.engine().current_index(), 1);
    assert_ne!(first.draws[0].id, later.draws[0].id);
}

#[test]
fn empty_set_never_starts() {
    let mut p = preview(2.0);
    assert!(!p.start(&ImageSet::new(1)));
    assert!(!p.is_running());
}
