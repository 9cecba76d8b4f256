use super::*;
use crate::{assets::Raster, composite::draw::focal_world_point, model::image::ImageRecord};

fn add(set: ImageSet, created_at: u64, focal: Option<(f64, f64)>) -> (ImageSet, ImageId) {
    let (set, id) = set
        .with_raster(Raster::solid(100, 100, [200, 200, 200, 255]).unwrap(), created_at)
        .unwrap();
    let mut r: ImageRecord = set.get(id).unwrap().clone();
    r.focal_point = focal.map(|(x, y)| Point::new(x, y));
    (set.with_replaced(r).unwrap(), id)
}

fn scenario() -> (ImageSet, [ImageId; 3]) {
    let set = ImageSet::new(10);
    let (set, a) = add(set, 0, Some((50.0, 50.0)));
    let (set, b) = add(set, 1, Some((20.0, 20.0)));
    let (set, c) = add(set, 2, Some((80.0, 80.0)));
    (set, [a, b, c])
}

#[test]
fn three_image_scenario_lands_on_shared_anchor() {
    let (set, [a, b, c]) = scenario();
    let aligned = align(&set, 0.1).unwrap();

    assert_eq!(aligned.get(a).unwrap().placement.position, Point::new(0.0, 0.0));
    assert_eq!(aligned.get(b).unwrap().placement.position, Point::new(30.0, 30.0));
    assert_eq!(aligned.get(c).unwrap().placement.position, Point::new(-30.0, -30.0));
    for id in [a, b, c] {
        let w = focal_world_point(aligned.get(id).unwrap(), 0.1).unwrap();
        assert!((w.x - 50.0).abs() < 1e-9 && (w.y - 50.0).abs() < 1e-9);
    }
}

#[test]
fn second_run_changes_nothing() {
    let (set, [_, b, _]) = scenario();
    let mut rb = set.get(b).unwrap().clone();
    rb.placement.rotation_rad = 0.7;
    rb.placement.scale = 1.3;
    rb.frame_zoom = Some(2.0);
    let set = set.with_replaced(rb).unwrap();

    let once = align(&set, 0.1).unwrap();
    let twice = align(&once, 0.1).unwrap();
    for (r1, r2) in once.records().iter().zip(twice.records()) {
        assert_eq!(r1.placement, r2.placement);
    }
    assert_eq!(twice.version(), once.version());
}

#[test]
fn fewer_than_two_focal_points_is_insufficient() {
    let set = ImageSet::new(10);
    let (set, _) = add(set, 0, None);
    assert!(matches!(
        solve_alignment(&set, 0.1),
        Err(FocalError::InsufficientAnchors { found: 0 })
    ));
    let (set, _) = add(set, 1, Some((10.0, 10.0)));
    let before = set.version();
    assert!(matches!(
        align(&set, 0.1),
        Err(FocalError::InsufficientAnchors { found: 1 })
    ));
    assert_eq!(set.version(), before);
}

#[test]
fn reference_is_chosen_by_temporal_key_not_arrival() {
    let set = ImageSet::new(10);
    let (set, late) = add(set, 10, Some((50.0, 50.0)));
    let (set, early) = add(set, 1, Some((20.0, 20.0)));
    let result = solve_alignment(&set, 0.1).unwrap();
    assert_eq!(result.reference, early);
    assert_eq!(result.anchor, Point::new(20.0, 20.0));
    assert_eq!(result.positions[1], (late, Point::new(-30.0, -30.0)));
}

#[test]
fn images_without_focal_points_are_untouched() {
    let (set, _) = scenario();
    let (set, loose) = add(set, 3, None);
    let mut r = set.get(loose).unwrap().clone();
    r.placement.position = Point::new(400.0, -12.0);
    let set = set.with_replaced(r).unwrap();

    let aligned = align(&set, 0.1).unwrap();
    assert_eq!(
        aligned.get(loose).unwrap().placement.position,
        Point::new(400.0, -12.0)
    );
}
