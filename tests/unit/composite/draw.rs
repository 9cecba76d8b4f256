use super::*;
use crate::foundation::core::Size;
use crate::model::image::Placement;

fn record(w: f64, h: f64) -> ImageRecord {
    ImageRecord {
        id: ImageId(7),
        raster: Some(Raster::solid(w as u32, h as u32, [0, 255, 0, 255]).unwrap()),
        natural_size: Size::new(w, h),
        placement: Placement::default(),
        frame_zoom: None,
        frame_offset: None,
        focal_point: None,
        opacity: 1.0,
        draw_rank: 0,
        created_at: 0,
    }
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[test]
fn zero_alpha_or_zero_opacity_skips_the_draw() {
    let r = record(10.0, 10.0);
    assert!(image_draw(&r, 0.0, &DrawOptions::default()).unwrap().is_none());
    assert!(image_draw(&r, f64::NAN, &DrawOptions::default()).unwrap().is_none());
    let hidden = ImageRecord {
        opacity: 0.0,
        ..r
    };
    assert!(image_draw(&hidden, 1.0, &DrawOptions::default()).unwrap().is_none());
}

#[test]
fn pending_raster_reports_decode_skipped() {
    let r = ImageRecord {
        raster: None,
        ..record(10.0, 10.0)
    };
    let err = image_draw(&r, 1.0, &DrawOptions::default()).unwrap_err();
    assert!(matches!(err, FocalError::DecodeSkipped { id: 7 }));
}

#[test]
fn opacity_multiplies_record_opacity() {
    let r = ImageRecord {
        opacity: 0.5,
        ..record(4.0, 4.0)
    };
    let d = image_draw(&r, 0.5, &DrawOptions::default()).unwrap().unwrap();
    assert!((d.opacity - 0.25).abs() < 1e-12);
}

#[test]
fn defaults_resolve_to_unit_zoom_and_zero_offset() {
    let r = record(10.0, 10.0);
    let f = ResolvedFraming::resolve(&r, 0.1);
    assert_eq!(f.zoom, 1.0);
    assert_eq!(f.offset, Vec2::ZERO);
    let tiny = ImageRecord {
        frame_zoom: Some(0.001),
        ..r
    };
    assert_eq!(ResolvedFraming::resolve(&tiny, 0.1).zoom, 0.1);
}

#[test]
fn marker_formula_matches_raster_transform_and_inverts() {
    let r = ImageRecord {
        frame_zoom: Some(2.5),
        frame_offset: Some(Vec2::new(-13.0, 4.5)),
        focal_point: Some(Point::new(30.0, 70.0)),
        ..record(100.0, 80.0)
    };
    let framing = ResolvedFraming::resolve(&r, 0.1);
    let p = Point::new(30.0, 70.0);
    let local = image_to_frame_local(&r, framing, p);
    // (50,40) + ((30,70) - (50,40)) * 2.5 + (-13, 4.5)
    assert!(close(local, Point::new(-13.0, 119.5)));
    assert!(close(raster_to_frame(&r, framing) * p, local));
    assert!(close(frame_local_to_image(&r, framing, local), p));

    let d = image_draw(
        &r,
        1.0,
        &DrawOptions {
            focal_markers: true,
            ..DrawOptions::default()
        },
    )
    .unwrap()
    .unwrap();
    assert!(close(d.focal_marker.unwrap(), local));
}

#[test]
fn markers_are_omitted_unless_requested() {
    let r = ImageRecord {
        focal_point: Some(Point::new(1.0, 1.0)),
        ..record(4.0, 4.0)
    };
    let d = image_draw(&r, 1.0, &DrawOptions::default()).unwrap().unwrap();
    assert!(d.focal_marker.is_none());
}

#[test]
fn clip_is_the_natural_frame_independent_of_zoom() {
    let r = ImageRecord {
        frame_zoom: Some(3.0),
        frame_offset: Some(Vec2::new(20.0, 0.0)),
        ..record(40.0, 20.0)
    };
    let d = image_draw(&r, 1.0, &DrawOptions::default()).unwrap().unwrap();
    assert_eq!(d.clip, Rect::new(0.0, 0.0, 40.0, 20.0));
    assert_eq!(d.raster_rect, d.clip);

    let shrunk = ImageRecord {
        frame_zoom: Some(0.5),
        frame_offset: None,
        ..r
    };
    let d = image_draw(&shrunk, 1.0, &DrawOptions::default()).unwrap().unwrap();
    assert_eq!(d.raster_rect, Rect::new(10.0, 5.0, 30.0, 15.0));
}

#[test]
fn focal_world_point_applies_placement() {
    let r = ImageRecord {
        focal_point: Some(Point::new(10.0, 0.0)),
        placement: Placement {
            position: Point::new(100.0, 100.0),
            scale: 2.0,
            rotation_rad: std::f64::consts::FRAC_PI_2,
        },
        ..record(20.0, 20.0)
    };
    let w = focal_world_point(&r, 0.1).unwrap();
    assert!(close(w, Point::new(100.0, 120.0)));
    assert!(focal_world_point(&record(2.0, 2.0), 0.1).is_none());
}
