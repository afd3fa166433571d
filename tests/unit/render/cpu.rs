use super::*;
use crate::assets::decode::decode_source_image;
use crate::canvas::stroke::StrokeId;
use crate::foundation::core::Point;

fn hline(y: f64, x0: f64, x1: f64, width: f64, color: Rgba8) -> Stroke {
    Stroke::new(
        StrokeId(0),
        vec![Point::new(x0, y), Point::new(x1, y)],
        width,
        color,
    )
}

fn solid_png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn coverage_is_zero_without_strokes() {
    let mut r = CpuRasterizer::new();
    let cov = r.render_coverage(16, 8, &[]).unwrap();
    assert_eq!(cov.len(), 16 * 8);
    assert!(cov.iter().all(|&a| a == 0));
}

#[test]
fn coverage_marks_stroke_band() {
    let mut r = CpuRasterizer::new();
    let s = hline(8.0, -4.0, 36.0, 4.0, Rgba8::HIGHLIGHT);
    let cov = r.render_coverage(32, 16, &[s]).unwrap();
    let at = |x: usize, y: usize| cov[y * 32 + x];
    assert!(at(10, 7) > 200);
    assert!(at(10, 8) > 200);
    assert_eq!(at(10, 0), 0);
    assert_eq!(at(10, 15), 0);
}

#[test]
fn dot_strokes_are_filled() {
    let mut r = CpuRasterizer::new();
    let dot = Stroke::new(StrokeId(0), vec![Point::new(8.0, 8.0)], 8.0, Rgba8::HIGHLIGHT);
    let cov = r.render_coverage(16, 16, &[dot]).unwrap();
    assert!(cov[8 * 16 + 8] > 200);
    assert_eq!(cov[0], 0);
}

#[test]
fn composition_draws_background_then_translucent_strokes() {
    let src = decode_source_image(solid_png(8, 8, [0, 0, 255, 255]), "bg.png").unwrap();
    let mut r = CpuRasterizer::new();
    let s = hline(4.0, -2.0, 10.0, 4.0, Rgba8::HIGHLIGHT);
    let frame = r
        .render_composition(
            8,
            8,
            Some(BackgroundDraw {
                image: &src,
                transform: Affine::IDENTITY,
            }),
            &[&s],
        )
        .unwrap();
    assert!(frame.premultiplied);
    let px = |x: usize, y: usize| &frame.data[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4];

    // Untouched background stays blue and opaque.
    let bg = px(4, 0);
    assert!(bg[0] < 5 && bg[2] > 250 && bg[3] > 250);
    // Under the stroke, red is blended over blue.
    let under = px(4, 4);
    assert!(under[3] > 250);
    assert!(under[0] > 100);
    assert!(under[2] > 100 && under[2] < 255);
}

#[test]
fn zero_or_oversized_targets_fail() {
    let mut r = CpuRasterizer::new();
    assert!(matches!(
        r.render_coverage(0, 4, &[]),
        Err(UnmarkError::Rasterization(_))
    ));
    assert!(matches!(
        r.render_coverage(70_000, 4, &[]),
        Err(UnmarkError::Rasterization(_))
    ));
}

#[test]
fn pixmap_side_fit_keeps_aspect_within_limit() {
    assert_eq!(fit_pixmap_side(640, 480), (640, 480));
    assert_eq!(fit_pixmap_side(65_535, 2), (65_535, 2));
    let (w, h) = fit_pixmap_side(131_070, 1_000);
    assert_eq!((w, h), (65_535, 500));
    let (w, h) = fit_pixmap_side(10, 200_000);
    assert!(h <= 65_535 && w >= 1);
}

#[test]
fn oversized_background_is_downsampled_for_preview() {
    let src = decode_source_image(solid_png(70_000, 2, [0, 0, 255, 255]), "wide.png").unwrap();
    let mut r = CpuRasterizer::new();
    let frame = r
        .render_composition(
            100,
            1,
            Some(BackgroundDraw {
                image: &src,
                transform: Affine::scale_non_uniform(100.0 / 70_000.0, 0.5),
            }),
            &[],
        )
        .unwrap();
    let px = &frame.data[50 * 4..50 * 4 + 4];
    assert!(px[2] > 240 && px[3] > 240);
    assert!(px[0] < 10);
}
