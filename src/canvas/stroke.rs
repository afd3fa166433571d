use crate::config::{MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH};
use crate::foundation::core::{Affine, BezPath, Point, Rgba8};
use crate::foundation::error::{UnmarkError, UnmarkResult};

/// Identifier of a committed stroke, unique within its layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrokeId(pub u64);

/// One freehand path drawn by the user, in canvas display coordinates.
///
/// Geometry, width and color are fixed at creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    id: StrokeId,
    points: Vec<Point>,
    width: f64,
    color: Rgba8,
}

impl Stroke {
    /// Build a stroke directly from its points.
    pub fn new(id: StrokeId, points: Vec<Point>, width: f64, color: Rgba8) -> Self {
        Self {
            id,
            points,
            width,
            color,
        }
    }

    /// Stroke identifier.
    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Input points in arrival order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Brush width the stroke was drawn with (display pixels).
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Editing color.
    pub fn color(&self) -> Rgba8 {
        self.color
    }

    /// A single-point stroke is a round dot of diameter `width`.
    pub fn dot(&self) -> Option<kurbo::Circle> {
        match self.points.as_slice() {
            [p] => Some(kurbo::Circle::new(*p, self.width / 2.0)),
            _ => None,
        }
    }

    /// Centerline path, smoothed with quadratic segments through point midpoints.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let pts = &self.points;
        let Some(&first) = pts.first() else {
            return path;
        };
        path.move_to(first);
        match pts.len() {
            1 => path.line_to(first),
            2 => path.line_to(pts[1]),
            n => {
                for i in 1..n - 1 {
                    path.quad_to(pts[i], pts[i].midpoint(pts[i + 1]));
                }
                path.line_to(pts[n - 1]);
            }
        }
        path
    }

    /// Return a copy with geometry and width mapped through a uniform scale.
    pub fn scaled(&self, factor: f64) -> Self {
        let a = Affine::scale(factor);
        Self {
            id: self.id,
            points: self.points.iter().map(|&p| a * p).collect(),
            width: self.width * factor,
            color: self.color,
        }
    }
}

/// Live brush settings applied to strokes started after a change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    /// Width in display pixels.
    pub width: f64,
    /// Editing color.
    pub color: Rgba8,
}

/// Ordered collection of committed strokes plus the one currently being drawn.
#[derive(Clone, Debug)]
pub struct StrokeLayer {
    brush: Brush,
    strokes: Vec<Stroke>,
    active: Option<Stroke>,
    next_id: u64,
}

impl StrokeLayer {
    /// Create an empty layer with the given starting brush.
    pub fn new(brush: Brush) -> UnmarkResult<Self> {
        validate_brush_width(brush.width)?;
        Ok(Self {
            brush,
            strokes: Vec::new(),
            active: None,
            next_id: 0,
        })
    }

    /// Current brush.
    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Change the brush width for strokes started from now on.
    pub fn set_brush_width(&mut self, width: f64) -> UnmarkResult<()> {
        validate_brush_width(width)?;
        self.brush.width = width;
        Ok(())
    }

    /// Begin a new stroke at `at`. Any unfinished stroke is committed first.
    pub fn start_stroke(&mut self, at: Point) {
        if self.active.is_some() {
            self.commit_stroke();
        }
        let id = StrokeId(self.next_id);
        self.next_id += 1;
        self.active = Some(Stroke::new(id, vec![at], self.brush.width, self.brush.color));
    }

    /// Append a drag point to the active stroke. Ignored when no stroke is active.
    pub fn extend_stroke(&mut self, to: Point) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.points.last() != Some(&to) {
            active.points.push(to);
        }
    }

    /// Finish the active stroke and append it to the layer.
    pub fn commit_stroke(&mut self) -> Option<StrokeId> {
        let stroke = self.active.take()?;
        if stroke.points.is_empty() {
            return None;
        }
        let id = stroke.id;
        tracing::debug!(
            id = id.0,
            points = stroke.points.len(),
            width = stroke.width,
            "stroke committed"
        );
        self.strokes.push(stroke);
        Some(id)
    }

    /// Drop the active stroke without committing it.
    pub fn cancel_stroke(&mut self) {
        self.active = None;
    }

    /// Stroke being drawn, if any.
    pub fn active(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    /// Remove every committed stroke and any stroke in progress.
    pub fn remove_all(&mut self) {
        tracing::debug!(removed = self.strokes.len(), "strokes cleared");
        self.strokes.clear();
        self.active = None;
    }

    /// Committed strokes in drawing order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Number of committed strokes.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Return `true` when no stroke has been committed.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub(crate) fn rescale(&mut self, factor: f64) {
        for s in &mut self.strokes {
            *s = s.scaled(factor);
        }
        if let Some(a) = self.active.as_mut() {
            *a = a.scaled(factor);
        }
    }
}

fn validate_brush_width(width: f64) -> UnmarkResult<()> {
    if !(MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH).contains(&width) {
        return Err(UnmarkError::validation(format!(
            "brush width {width} outside {MIN_BRUSH_WIDTH}..={MAX_BRUSH_WIDTH}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/stroke.rs"]
mod tests;
