use super::*;

const EPS: f64 = 1e-9;

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= EPS * (1.0 + a.x.abs()) && (a.y - b.y).abs() <= EPS * (1.0 + a.y.abs())
}

fn viewports() -> Vec<Viewport> {
    let mut out = Vec::new();
    for &zoom in &[0.1, 0.37, 1.0, 2.5, 10.0] {
        for &(ox, oy) in &[(0.0, 0.0), (-1234.5, 77.25), (1e5, -3e4)] {
            let mut v = Viewport::new(Size::new(800.0, 600.0), ZoomLimits::default());
            v.set_origin(Point::new(ox, oy));
            v.zoom_at(Point::ORIGIN, zoom);
            v.set_origin(Point::new(ox, oy));
            out.push(v);
        }
    }
    out
}

#[test]
fn world_screen_round_trip_is_identity() {
    let points = [
        Point::new(0.0, 0.0),
        Point::new(400.0, 300.0),
        Point::new(-17.3, 999.9),
        Point::new(12345.678, -0.001),
    ];
    for v in viewports() {
        for &p in &points {
            assert!(close(v.world_to_screen(v.screen_to_world(p)), p), "{v:?} {p:?}");
            assert!(close(v.screen_to_world(v.world_to_screen(p)), p), "{v:?} {p:?}");
        }
    }
}

#[test]
fn zoom_keeps_world_point_under_anchor() {
    let anchors = [Point::new(0.0, 0.0), Point::new(400.0, 300.0), Point::new(731.0, 12.0)];
    for mut v in viewports() {
        for &anchor in &anchors {
            let before = v.screen_to_world(anchor);
            v.zoom_by(anchor, 1.7);
            let after = v.screen_to_world(anchor);
            assert!(close(before, after), "{before:?} vs {after:?}");
            assert!(close(v.world_to_screen(before), anchor));
        }
    }
}

#[test]
fn zoom_is_clamped_to_limits() {
    let limits = ZoomLimits { min: 0.5, max: 3.0 };
    let mut v = Viewport::new(Size::new(100.0, 100.0), limits);
    v.zoom_at(Point::new(50.0, 50.0), 100.0);
    assert_eq!(v.zoom(), 3.0);
    v.zoom_at(Point::new(50.0, 50.0), 0.0001);
    assert_eq!(v.zoom(), 0.5);
}

#[test]
fn pan_moves_content_with_the_pointer() {
    let mut v = Viewport::new(Size::new(100.0, 100.0), ZoomLimits::default());
    v.zoom_at(Point::ORIGIN, 2.0);
    let world = Point::new(10.0, 10.0);
    let before = v.world_to_screen(world);
    v.pan_by_screen(Vec2::new(30.0, -8.0));
    let after = v.world_to_screen(world);
    assert!(close(after, before + Vec2::new(30.0, -8.0)));
}

#[test]
fn affine_matches_point_mapping() {
    for v in viewports() {
        let p = Point::new(42.0, -7.5);
        assert!(close(v.to_affine() * p, v.world_to_screen(p)));
    }
}

#[test]
fn visible_rect_spans_the_surface() {
    let mut v = Viewport::new(Size::new(200.0, 100.0), ZoomLimits::default());
    v.zoom_at(Point::ORIGIN, 2.0);
    let r = v.visible_world_rect();
    assert!((r.width() - 100.0).abs() < EPS);
    assert!((r.height() - 50.0).abs() < EPS);
}

#[test]
fn fit_to_centres_bounds() {
    let mut v = Viewport::new(Size::new(400.0, 200.0), ZoomLimits::default());
    let bounds = Rect::new(100.0, 100.0, 300.0, 200.0);
    v.fit_to(bounds, 0.0).unwrap();
    let c = v.world_to_screen(bounds.center());
    assert!(close(c, Point::new(200.0, 100.0)));
    assert!(v.fit_to(Rect::new(0.0, 0.0, 0.0, 0.0), 0.0).is_err());
}
