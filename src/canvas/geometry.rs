use crate::config::ViewportUsage;
use crate::foundation::core::{Affine, Point, Viewport};
use crate::foundation::error::{UnmarkError, UnmarkResult};

/// Display size of the canvas and its relation to the source image.
///
/// Derived from the natural image size and the viewport; never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasGeometry {
    /// Natural image width in pixels.
    pub natural_width: u32,
    /// Natural image height in pixels.
    pub natural_height: u32,
    /// Canvas width in display pixels.
    pub display_width: u32,
    /// Canvas height in display pixels.
    pub display_height: u32,
    /// `display / natural`, at most 1.
    pub scale_factor: f64,
}

impl CanvasGeometry {
    /// Fit a `natural_width x natural_height` image into the usable part of `viewport`.
    ///
    /// `scale_factor = min(1, max_w / natural_w, max_h / natural_h)` where `max_*` is the viewport
    /// side times its usage fraction. Images are never upscaled.
    pub fn fit(
        natural_width: u32,
        natural_height: u32,
        viewport: Viewport,
        usage: ViewportUsage,
    ) -> UnmarkResult<Self> {
        if natural_width == 0 || natural_height == 0 {
            return Err(UnmarkError::validation("image must have a non-zero size"));
        }
        let max_w = viewport.width * usage.width;
        let max_h = viewport.height * usage.height;
        if !(max_w > 0.0 && max_h > 0.0) {
            return Err(UnmarkError::validation(format!(
                "usable viewport area is empty ({max_w}x{max_h})"
            )));
        }

        let nw = f64::from(natural_width);
        let nh = f64::from(natural_height);
        let scale_factor = 1f64.min(max_w / nw).min(max_h / nh);

        let side = |n: f64| ((n * scale_factor).round() as u32).max(1);
        Ok(Self {
            natural_width,
            natural_height,
            display_width: side(nw),
            display_height: side(nh),
            scale_factor,
        })
    }

    /// Display size as `(width, height)`.
    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    /// Natural size as `(width, height)`.
    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    /// Transform mapping display coordinates onto natural image coordinates.
    pub fn display_to_natural(&self) -> Affine {
        Affine::scale(1.0 / self.scale_factor)
    }

    /// Transform mapping natural image coordinates onto display coordinates.
    pub fn natural_to_display(&self) -> Affine {
        Affine::scale(self.scale_factor)
    }

    /// Map one display-space point into natural image space.
    pub fn to_natural(&self, p: Point) -> Point {
        self.display_to_natural() * p
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/geometry.rs"]
mod tests;
