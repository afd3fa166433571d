//! Mask extraction.
//!
//! The mask is rendered from a freshly built offscreen composition: white strokes on black, no
//! background image. The editing surface is only borrowed for the duration of the render; its
//! background visibility and stroke colors are never touched.

use crate::canvas::geometry::CanvasGeometry;
use crate::canvas::stroke::Stroke;
use crate::canvas::surface::ScaledCanvasSurface;
use crate::config::MaskResolution;
use crate::foundation::error::{UnmarkError, UnmarkResult};
use crate::render::backend::{MaskImage, encode_rgba8_png};
use crate::render::cpu::CpuRasterizer;

/// Rasterize `strokes` into a binary mask.
///
/// Strokes are in display coordinates. With [`MaskResolution::Display`] the mask has the canvas
/// display size; with [`MaskResolution::Natural`] strokes are scaled into natural image space and
/// the mask matches the source image size. Any pixel a stroke touches is white, every other pixel
/// is black.
#[tracing::instrument(skip(strokes, geometry), fields(strokes = strokes.len()))]
pub fn render_mask(
    strokes: &[Stroke],
    geometry: &CanvasGeometry,
    resolution: MaskResolution,
) -> UnmarkResult<MaskImage> {
    let (width, height) = match resolution {
        MaskResolution::Display => geometry.display_size(),
        MaskResolution::Natural => geometry.natural_size(),
    };

    let natural: Vec<Stroke>;
    let strokes = match resolution {
        MaskResolution::Display => strokes,
        MaskResolution::Natural => {
            let factor = 1.0 / geometry.scale_factor;
            natural = strokes.iter().map(|s| s.scaled(factor)).collect();
            &natural
        }
    };

    let coverage = CpuRasterizer::new().render_coverage(width, height, strokes)?;
    let png = encode_rgba8_png(width, height, binarize(&coverage))?;
    tracing::debug!(width, height, bytes = png.len(), "mask rendered");
    Ok(MaskImage { width, height, png })
}

/// Extract the mask for everything committed on `surface`.
///
/// Fails with [`UnmarkError::Rasterization`] when no image is loaded.
pub fn extract_mask(surface: &ScaledCanvasSurface) -> UnmarkResult<MaskImage> {
    let geometry = surface
        .geometry()
        .ok_or_else(|| UnmarkError::rasterization("no image loaded on the canvas"))?;
    render_mask(
        surface.strokes().strokes(),
        geometry,
        surface.config().mask_resolution,
    )
}

fn binarize(coverage: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(coverage.len() * 4);
    for &a in coverage {
        let v = if a > 0 { 255 } else { 0 };
        out.extend_from_slice(&[v, v, v, 255]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/mask.rs"]
mod tests;
