use crate::assets::decode::SourceImage;
use crate::canvas::geometry::CanvasGeometry;
use crate::canvas::stroke::{Brush, Stroke, StrokeId, StrokeLayer};
use crate::config::EditorConfig;
use crate::foundation::core::{Point, Viewport};
use crate::foundation::error::{UnmarkError, UnmarkResult};
use crate::render::backend::FrameRGBA;
use crate::render::cpu::{BackgroundDraw, CpuRasterizer};

#[derive(Clone, Debug)]
struct BackgroundLayer {
    image: SourceImage,
    geometry: CanvasGeometry,
}

/// Drawing surface sized to fit the viewport, hosting the background image and the stroke layer.
///
/// The background is held apart from the stroke collection and always renders behind it; stroke
/// operations cannot reach it. Strokes are authored in the display space established by
/// [`ScaledCanvasSurface::load_background`].
pub struct ScaledCanvasSurface {
    config: EditorConfig,
    viewport: Viewport,
    background: Option<BackgroundLayer>,
    strokes: StrokeLayer,
    rasterizer: CpuRasterizer,
}

impl ScaledCanvasSurface {
    /// Create an empty surface for `viewport`.
    pub fn initialize(viewport: Viewport, config: EditorConfig) -> UnmarkResult<Self> {
        viewport.validate()?;
        config.validate()?;
        let strokes = StrokeLayer::new(Brush {
            width: config.default_brush_width,
            color: config.highlight_color,
        })?;
        Ok(Self {
            config,
            viewport,
            background: None,
            strokes,
            rasterizer: CpuRasterizer::new(),
        })
    }

    /// Place `image` as the background and size the surface to fit it.
    ///
    /// Replaces any previous background and removes all strokes.
    pub fn load_background(&mut self, image: SourceImage) -> UnmarkResult<CanvasGeometry> {
        let geometry = CanvasGeometry::fit(
            image.width,
            image.height,
            self.viewport,
            self.config.viewport_usage,
        )?;
        tracing::debug!(
            natural_w = geometry.natural_width,
            natural_h = geometry.natural_height,
            display_w = geometry.display_width,
            display_h = geometry.display_height,
            scale = geometry.scale_factor,
            "background loaded"
        );
        self.strokes.remove_all();
        self.background = Some(BackgroundLayer { image, geometry });
        Ok(geometry)
    }

    /// Resize for a new viewport; strokes are rescaled to stay over the same image content.
    pub fn set_viewport(&mut self, viewport: Viewport) -> UnmarkResult<Option<CanvasGeometry>> {
        viewport.validate()?;
        let Some(bg) = self.background.as_mut() else {
            self.viewport = viewport;
            return Ok(None);
        };
        let next = CanvasGeometry::fit(
            bg.image.width,
            bg.image.height,
            viewport,
            self.config.viewport_usage,
        )?;
        let factor = next.scale_factor / bg.geometry.scale_factor;
        if factor != 1.0 {
            self.strokes.rescale(factor);
        }
        bg.geometry = next;
        self.viewport = viewport;
        Ok(Some(next))
    }

    /// Background image, if one is loaded.
    pub fn background(&self) -> Option<&SourceImage> {
        self.background.as_ref().map(|bg| &bg.image)
    }

    /// Current geometry, if an image is loaded.
    pub fn geometry(&self) -> Option<&CanvasGeometry> {
        self.background.as_ref().map(|bg| &bg.geometry)
    }

    /// Viewport the surface is fitted into.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Settings the surface was created with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Read access to the stroke layer.
    pub fn strokes(&self) -> &StrokeLayer {
        &self.strokes
    }

    /// Change the brush width for strokes drawn from now on.
    pub fn set_brush_width(&mut self, width: f64) -> UnmarkResult<()> {
        self.strokes.set_brush_width(width)
    }

    /// Pointer pressed at `at` (display coordinates): starts a stroke.
    pub fn pointer_down(&mut self, at: Point) -> UnmarkResult<()> {
        self.require_background()?;
        self.strokes.start_stroke(at);
        Ok(())
    }

    /// Pointer dragged to `to`: extends the active stroke.
    pub fn pointer_move(&mut self, to: Point) -> UnmarkResult<()> {
        self.require_background()?;
        self.strokes.extend_stroke(to);
        Ok(())
    }

    /// Pointer released: commits the active stroke.
    pub fn pointer_up(&mut self) -> UnmarkResult<Option<StrokeId>> {
        self.require_background()?;
        Ok(self.strokes.commit_stroke())
    }

    /// Remove every stroke. The background stays in place.
    pub fn clear_strokes(&mut self) {
        self.strokes.remove_all();
    }

    /// Render what the user sees: the scaled background with translucent strokes over it.
    pub fn render_preview(&mut self) -> UnmarkResult<FrameRGBA> {
        let bg = self
            .background
            .as_ref()
            .ok_or_else(|| UnmarkError::rasterization("no image loaded on the canvas"))?;
        let mut layers: Vec<&Stroke> = self.strokes.strokes().iter().collect();
        layers.extend(self.strokes.active());

        self.rasterizer.render_composition(
            bg.geometry.display_width,
            bg.geometry.display_height,
            Some(BackgroundDraw {
                image: &bg.image,
                transform: bg.geometry.natural_to_display(),
            }),
            &layers,
        )
    }

    /// Tear the surface down, releasing its raster resources.
    pub fn dispose(self) {
        tracing::debug!(strokes = self.strokes.len(), "surface disposed");
    }

    fn require_background(&self) -> UnmarkResult<()> {
        if self.background.is_none() {
            return Err(UnmarkError::validation("no image loaded on the canvas"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/surface.rs"]
mod tests;
