use std::sync::Arc;

use kurbo::Shape;

use crate::assets::decode::SourceImage;
use crate::canvas::stroke::Stroke;
use crate::foundation::core::{Affine, BezPath, Rgba8};
use crate::foundation::error::{UnmarkError, UnmarkResult};
use crate::render::backend::FrameRGBA;

const DOT_TOLERANCE: f64 = 0.1;

/// Largest pixmap side vello_cpu accepts.
const MAX_PIXMAP_SIDE: u32 = u16::MAX as u32;

/// Background layer of a composition: the source bitmap and where it lands.
pub(crate) struct BackgroundDraw<'a> {
    pub(crate) image: &'a SourceImage,
    pub(crate) transform: Affine,
}

/// Background paint built from a [`SourceImage`], keyed by its pixel buffer.
///
/// Sources wider or taller than a pixmap allows are downsampled; `fit` maps the paint's pixel
/// space back onto the source's natural space.
struct CachedBackground {
    key: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
    width: u32,
    height: u32,
    fit: Affine,
}

/// CPU rasterizer powered by `vello_cpu`.
///
/// Keeps its render context between calls and rebuilds it only when the target size changes.
#[derive(Default)]
pub(crate) struct CpuRasterizer {
    ctx: Option<vello_cpu::RenderContext>,
    background: Option<CachedBackground>,
}

impl CpuRasterizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> UnmarkResult<R>,
    ) -> UnmarkResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// Draw `background` (if any) and then `strokes` in their own colors over a transparent
    /// target. Returns premultiplied pixels.
    pub(crate) fn render_composition(
        &mut self,
        width: u32,
        height: u32,
        background: Option<BackgroundDraw<'_>>,
        strokes: &[&Stroke],
    ) -> UnmarkResult<FrameRGBA> {
        let (w, h) = target_size(width, height)?;
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.with_ctx_mut(w, h, |this, ctx| {
            if let Some(bg) = background {
                let cached = this.background_paint(bg.image)?;
                ctx.set_transform(affine_to_cpu(bg.transform * cached.fit));
                ctx.set_paint(cached.paint.clone());
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(cached.width),
                    f64::from(cached.height),
                ));
            }
            for s in strokes {
                draw_stroke(ctx, s, s.color());
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        Ok(FrameRGBA {
            width,
            height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    /// Per-pixel stroke coverage (0..=255) for `strokes` drawn fully opaque.
    pub(crate) fn render_coverage(
        &mut self,
        width: u32,
        height: u32,
        strokes: &[Stroke],
    ) -> UnmarkResult<Vec<u8>> {
        let (w, h) = target_size(width, height)?;
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.with_ctx_mut(w, h, |_, ctx| {
            for s in strokes {
                draw_stroke(ctx, s, Rgba8::WHITE);
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        Ok(pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .map(|px| px[3])
            .collect())
    }

    fn background_paint(&mut self, image: &SourceImage) -> UnmarkResult<&CachedBackground> {
        let hit = self
            .background
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(&c.key, &image.rgba8_premul));
        if !hit {
            self.background = Some(build_background(image)?);
        }
        self.background
            .as_ref()
            .ok_or_else(|| UnmarkError::rasterization("background paint missing"))
    }
}

fn build_background(image: &SourceImage) -> UnmarkResult<CachedBackground> {
    let (width, height) = fit_pixmap_side(image.width, image.height);
    let pixmap = if (width, height) == (image.width, image.height) {
        pixmap_from_premul_bytes(&image.rgba8_premul, width, height)?
    } else {
        tracing::debug!(
            natural_w = image.width,
            natural_h = image.height,
            width,
            height,
            "downsampling oversized background"
        );
        let src = image::RgbaImage::from_raw(
            image.width,
            image.height,
            image.rgba8_premul.as_ref().clone(),
        )
        .ok_or_else(|| UnmarkError::rasterization("background byte len mismatch"))?;
        let small =
            image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle);
        pixmap_from_premul_bytes(small.as_raw(), width, height)?
    };
    Ok(CachedBackground {
        key: image.rgba8_premul.clone(),
        paint: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        },
        width,
        height,
        fit: Affine::scale_non_uniform(
            f64::from(image.width) / f64::from(width),
            f64::from(image.height) / f64::from(height),
        ),
    })
}

/// Largest size with the same aspect that fits within [`MAX_PIXMAP_SIDE`] on both sides.
fn fit_pixmap_side(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_PIXMAP_SIDE && height <= MAX_PIXMAP_SIDE {
        return (width, height);
    }
    let scale = (f64::from(MAX_PIXMAP_SIDE) / f64::from(width))
        .min(f64::from(MAX_PIXMAP_SIDE) / f64::from(height));
    let side = |n: u32| ((f64::from(n) * scale).floor() as u32).clamp(1, MAX_PIXMAP_SIDE);
    (side(width), side(height))
}

fn draw_stroke(ctx: &mut vello_cpu::RenderContext, stroke: &Stroke, color: Rgba8) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    if let Some(dot) = stroke.dot() {
        let mut p = BezPath::new();
        for el in dot.path_elements(DOT_TOLERANCE) {
            p.push(el);
        }
        ctx.fill_path(&bezpath_to_cpu(&p));
        return;
    }
    ctx.set_stroke(
        vello_cpu::kurbo::Stroke::new(stroke.width())
            .with_caps(vello_cpu::kurbo::Cap::Round)
            .with_join(vello_cpu::kurbo::Join::Round),
    );
    ctx.stroke_path(&bezpath_to_cpu(&stroke.to_path()));
}

fn target_size(width: u32, height: u32) -> UnmarkResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(UnmarkError::rasterization("render target has zero size"));
    }
    let w: u16 = width.try_into().map_err(|_| {
        UnmarkError::rasterization(format!("target width {width} exceeds u16"))
    })?;
    let h: u16 = height.try_into().map_err(|_| {
        UnmarkError::rasterization(format!("target height {height} exceeds u16"))
    })?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> UnmarkResult<vello_cpu::Pixmap> {
    let (w, h) = target_size(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(UnmarkError::rasterization("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
