use std::io::Cursor;

use crate::foundation::error::{UnmarkError, UnmarkResult};

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Encode the frame as PNG.
    ///
    /// Premultiplied frames are converted to straight alpha first.
    pub fn encode_png(&self) -> UnmarkResult<Vec<u8>> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        encode_rgba8_png(self.width, self.height, data)
    }
}

/// Binary erase mask: black background, white where the backend should inpaint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskImage {
    /// Mask width in pixels.
    pub width: u32,
    /// Mask height in pixels.
    pub height: u32,
    /// Opaque RGBA8 PNG with `R = G = B` in `{0, 255}`.
    pub png: Vec<u8>,
}

impl MaskImage {
    /// File name the mask is uploaded under.
    pub const FILE_NAME: &'static str = "mask.png";

    /// Decode the PNG back into one luma byte per pixel.
    pub fn decode_luma(&self) -> UnmarkResult<Vec<u8>> {
        let img = image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)
            .map_err(|e| UnmarkError::decode(format!("decode mask png: {e}")))?;
        Ok(img.to_luma8().into_raw())
    }
}

pub(crate) fn encode_rgba8_png(width: u32, height: u32, data: Vec<u8>) -> UnmarkResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| UnmarkError::rasterization("frame byte len mismatch"))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| UnmarkError::rasterization(format!("encode png: {e}")))?;
    Ok(out)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
