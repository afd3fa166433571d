use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use image::ImageFormat;

use crate::foundation::error::{UnmarkError, UnmarkResult};

/// A decoded upload: original encoded bytes plus display pixels.
///
/// Immutable once created; clones share the underlying buffers.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
    /// The bytes exactly as uploaded; these are what the backend receives.
    pub encoded: Arc<Vec<u8>>,
    /// MIME type sniffed from the encoded bytes.
    pub content_type: &'static str,
    /// File name the upload arrived with.
    pub file_name: String,
}

impl SourceImage {
    /// Read and decode an image file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> UnmarkResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read image '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        decode_source_image(bytes, name)
    }
}

/// Decode an uploaded image byte buffer.
///
/// Fails with [`UnmarkError::Decode`] when the bytes are not a supported image or decode to an
/// empty bitmap.
#[tracing::instrument(skip_all, fields(len = bytes.len()))]
pub fn decode_source_image(
    bytes: Vec<u8>,
    file_name: impl Into<String>,
) -> UnmarkResult<SourceImage> {
    let format = image::guess_format(&bytes)
        .map_err(|e| UnmarkError::decode(format!("unrecognized image format: {e}")))?;
    let dyn_img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| UnmarkError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(UnmarkError::decode("image has zero width or height"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    tracing::debug!(width, height, ?format, "decoded source image");
    Ok(SourceImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
        encoded: Arc::new(bytes),
        content_type: mime_for(format),
        file_name: file_name.into(),
    })
}

/// Check that `bytes` decode as an image and return its dimensions.
pub(crate) fn probe_dimensions(bytes: &[u8]) -> UnmarkResult<(u32, u32)> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| UnmarkError::decode(format!("result is not a valid image: {e}")))?;
    Ok((img.width(), img.height()))
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
