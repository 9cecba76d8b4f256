use super::*;
use crate::{assets::Raster, foundation::core::Point, model::set::ImageSet};

fn spread_set() -> ImageSet {
    let set = ImageSet::new(4);
    let (set, a) = set
        .with_raster(Raster::solid(100, 100, [1, 2, 3, 255]).unwrap(), 0)
        .unwrap();
    let (set, b) = set
        .with_raster(Raster::solid(100, 100, [1, 2, 3, 255]).unwrap(), 1)
        .unwrap();
    let mut ra = set.get(a).unwrap().clone();
    ra.placement.position = Point::new(-1000.0, 0.0);
    let mut rb = set.get(b).unwrap().clone();
    rb.placement.position = Point::new(900.0, 300.0);
    set.with_replaced(ra).unwrap().with_replaced(rb).unwrap()
}

#[test]
fn far_apart_images_stay_on_surface() {
    let set = spread_set();
    let fit = fit_viewport(set.records(), Size::new(400.0, 300.0), 50.0).unwrap();
    assert_eq!(fit.content, Rect::new(-1050.0, -50.0, 1050.0, 450.0));
    assert!((fit.scale - 400.0 / 2100.0).abs() < 1e-12);

    for r in set.records() {
        let b = fit.view.transform_rect_bbox(crate::composite::hit::world_bounds(r));
        assert!(b.x0 >= -1e-9 && b.y0 >= -1e-9);
        assert!(b.x1 <= 400.0 + 1e-9 && b.y1 <= 300.0 + 1e-9);
    }
}

#[test]
fn small_content_is_centred_without_upscaling() {
    let set = ImageSet::new(1);
    let (set, _) = set
        .with_raster(Raster::solid(10, 10, [0, 0, 0, 255]).unwrap(), 0)
        .unwrap();
    let fit = fit_viewport(set.records(), Size::new(200.0, 100.0), 5.0).unwrap();
    assert_eq!(fit.scale, 1.0);
    assert_eq!(fit.view * Point::new(5.0, 5.0), Point::new(100.0, 50.0));
}

#[test]
fn nothing_to_fit() {
    assert!(fit_viewport(std::iter::empty(), Size::new(10.0, 10.0), 1.0).is_none());
    let set = spread_set();
    assert!(fit_viewport(set.records(), Size::new(0.0, 10.0), 1.0).is_none());
}
