use super::*;
use crate::assets::decode::decode_source_image;
use crate::config::ViewportUsage;

fn png(w: u32, h: u32) -> SourceImage {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([20, 200, 20, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    decode_source_image(buf, "green.png").unwrap()
}

fn surface(vw: f64, vh: f64) -> ScaledCanvasSurface {
    let cfg = EditorConfig {
        viewport_usage: ViewportUsage {
            width: 1.0,
            height: 1.0,
        },
        ..EditorConfig::default()
    };
    ScaledCanvasSurface::initialize(Viewport::new(vw, vh).unwrap(), cfg).unwrap()
}

fn stroke(s: &mut ScaledCanvasSurface, pts: &[(f64, f64)]) {
    s.pointer_down(Point::new(pts[0].0, pts[0].1)).unwrap();
    for &(x, y) in &pts[1..] {
        s.pointer_move(Point::new(x, y)).unwrap();
    }
    s.pointer_up().unwrap();
}

#[test]
fn load_background_sizes_surface() {
    let mut s = surface(100.0, 100.0);
    let g = s.load_background(png(200, 100)).unwrap();
    assert_eq!(g.display_size(), (100, 50));
    assert_eq!(s.geometry(), Some(&g));
    assert_eq!(s.background().map(|b| b.width), Some(200));
}

#[test]
fn pointer_input_requires_background() {
    let mut s = surface(100.0, 100.0);
    assert!(matches!(
        s.pointer_down(Point::new(1.0, 1.0)),
        Err(UnmarkError::Validation(_))
    ));
    assert!(s.pointer_up().is_err());
}

#[test]
fn clear_strokes_never_removes_background() {
    let mut s = surface(100.0, 100.0);
    s.load_background(png(50, 50)).unwrap();
    for n in 0..5 {
        for i in 0..n {
            let y = f64::from(i) * 7.0;
            stroke(&mut s, &[(0.0, y), (40.0, y + 3.0)]);
        }
        s.clear_strokes();
        assert!(s.strokes().is_empty());
        assert!(s.background().is_some());
        assert!(s.geometry().is_some());
    }
}

#[test]
fn loading_new_background_drops_old_strokes() {
    let mut s = surface(100.0, 100.0);
    s.load_background(png(50, 50)).unwrap();
    stroke(&mut s, &[(1.0, 1.0), (20.0, 20.0)]);
    s.load_background(png(60, 30)).unwrap();
    assert!(s.strokes().is_empty());
    assert_eq!(s.background().map(|b| b.width), Some(60));
}

#[test]
fn viewport_change_rescales_strokes() {
    let mut s = surface(100.0, 100.0);
    s.load_background(png(200, 200)).unwrap();
    s.set_brush_width(10.0).unwrap();
    stroke(&mut s, &[(10.0, 10.0), (50.0, 50.0)]);

    let g = s.set_viewport(Viewport::new(50.0, 50.0).unwrap()).unwrap().unwrap();
    assert_eq!(g.display_size(), (50, 50));
    let st = &s.strokes().strokes()[0];
    assert_eq!(st.points(), &[Point::new(5.0, 5.0), Point::new(25.0, 25.0)]);
    assert_eq!(st.width(), 5.0);
}

#[test]
fn preview_shows_background_and_strokes() {
    let mut s = surface(100.0, 100.0);
    s.load_background(png(40, 20)).unwrap();
    stroke(&mut s, &[(-5.0, 10.0), (45.0, 10.0)]);

    let frame = s.render_preview().unwrap();
    assert_eq!((frame.width, frame.height), (40, 20));
    let px = |x: usize, y: usize| &frame.data[(y * 40 + x) * 4..(y * 40 + x) * 4 + 4];
    let plain = px(20, 0);
    let under = px(20, 10);
    assert!(plain[1] > 150 && plain[0] < 40);
    assert!(under[0] > plain[0] + 60);

    // Preview does not alter the stroke layer.
    assert_eq!(s.strokes().len(), 1);
    assert_eq!(s.strokes().strokes()[0].color(), s.config().highlight_color);
}

#[test]
fn preview_without_background_is_a_rasterization_error() {
    let mut s = surface(100.0, 100.0);
    assert!(matches!(
        s.render_preview(),
        Err(UnmarkError::Rasterization(_))
    ));
}

#[test]
fn surfaces_can_be_created_and_disposed_repeatedly() {
    for _ in 0..8 {
        let mut s = surface(64.0, 64.0);
        s.load_background(png(32, 32)).unwrap();
        stroke(&mut s, &[(1.0, 1.0), (30.0, 30.0)]);
        s.render_preview().unwrap();
        s.dispose();
    }
}
