use crate::foundation::error::{UnmarkError, UnmarkResult};

pub use kurbo::{Affine, BezPath, Point, Vec2};

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Translucent red used to highlight strokes while editing.
    pub const HIGHLIGHT: Self = Self::new(255, 0, 0, 128);

    /// Build a color from straight channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Return the channels premultiplied by alpha.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

/// Size of the window hosting the canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Window width in pixels.
    pub width: f64,
    /// Window height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a validated viewport with finite, positive sides.
    pub fn new(width: f64, height: f64) -> UnmarkResult<Self> {
        let v = Self { width, height };
        v.validate()?;
        Ok(v)
    }

    /// Check that both sides are finite and positive.
    pub fn validate(&self) -> UnmarkResult<()> {
        let (w, h) = (self.width, self.height);
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(UnmarkError::validation(format!(
                "viewport must be positive, got {w}x{h}"
            )));
        }
        Ok(())
    }

    /// Parse `WIDTHxHEIGHT` (e.g. `1280x800`).
    pub fn parse(s: &str) -> UnmarkResult<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| UnmarkError::validation(format!("viewport '{s}' is not WxH")))?;
        let w: f64 = w
            .trim()
            .parse()
            .map_err(|e| UnmarkError::validation(format!("viewport width '{w}': {e}")))?;
        let h: f64 = h
            .trim()
            .parse()
            .map_err(|e| UnmarkError::validation(format!("viewport height '{h}': {e}")))?;
        Self::new(w, h)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
