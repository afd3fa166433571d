use super::*;

fn usage(w: f64, h: f64) -> ViewportUsage {
    ViewportUsage {
        width: w,
        height: h,
    }
}

#[test]
fn large_image_is_fit_into_usage_budget() {
    let viewport = Viewport::new(800.0, 600.0).unwrap();
    let g = CanvasGeometry::fit(4000, 3000, viewport, usage(0.8, 0.8)).unwrap();
    assert!((g.scale_factor - 0.16).abs() < 1e-12);
    assert_eq!(g.display_size(), (640, 480));
    assert_eq!(g.natural_size(), (4000, 3000));
}

#[test]
fn small_image_is_never_upscaled() {
    let viewport = Viewport::new(1920.0, 1080.0).unwrap();
    let g = CanvasGeometry::fit(300, 200, viewport, ViewportUsage::default()).unwrap();
    assert_eq!(g.scale_factor, 1.0);
    assert_eq!(g.display_size(), (300, 200));
}

#[test]
fn tighter_axis_wins() {
    // Usable area 800x360: height is the binding constraint for a square image.
    let viewport = Viewport::new(1000.0, 600.0).unwrap();
    let g = CanvasGeometry::fit(1200, 1200, viewport, ViewportUsage::default()).unwrap();
    assert!((g.scale_factor - 0.3).abs() < 1e-12);
    assert_eq!(g.display_size(), (360, 360));
}

#[test]
fn display_points_map_back_to_natural_space() {
    let viewport = Viewport::new(800.0, 600.0).unwrap();
    let g = CanvasGeometry::fit(4000, 3000, viewport, usage(0.8, 0.8)).unwrap();
    let p = g.to_natural(Point::new(320.0, 240.0));
    assert!((p.x - 2000.0).abs() < 1e-9);
    assert!((p.y - 1500.0).abs() < 1e-9);
}

#[test]
fn zero_sized_inputs_are_rejected() {
    let viewport = Viewport::new(800.0, 600.0).unwrap();
    assert!(CanvasGeometry::fit(0, 10, viewport, ViewportUsage::default()).is_err());
    assert!(CanvasGeometry::fit(10, 10, viewport, usage(0.0, 0.5)).is_err());
}
