//! Image normalization.
//!
//! Decodes any supported source format and re-encodes it as a three-channel
//! baseline JPEG, so every downstream consumer sees one format.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError};
use thiserror::Error;

/// A normalized JPEG ready to be written out.
pub struct NormalizedImage {
    /// Encoded JPEG bytes.
    pub data: Vec<u8>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

/// Failure while normalizing downloaded bytes.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("decode failed: {0}")]
    Decode(#[source] ImageError),

    #[error("encode failed: {0}")]
    Encode(#[source] ImageError),
}

/// Decode → flatten to RGB → encode as JPEG at `quality`.
pub fn normalize_to_jpeg(data: &[u8], quality: u8) -> Result<NormalizedImage, NormalizeError> {
    let img = image::load_from_memory(data).map_err(NormalizeError::Decode)?;

    // Palette, alpha and grayscale sources all end up as RGB8; the JPEG
    // encoder takes neither alpha nor palettes.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());
    let (width, height) = (img.width(), img.height());

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(NormalizeError::Encode)?;

    Ok(NormalizedImage {
        data: buf,
        width,
        height,
    })
}
