//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP, TIFF, WebP) | `image::load_from_memory` (magic-byte detection) |
//! | Decode JPEG only | `image::load_from_memory_with_format(.., Jpeg)` |
//! | Resample | `image::imageops::resize` with `Triangle` (bilinear) filter on RGBA8 |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode → PNG, BMP, TIFF | `DynamicImage::write_to` |

use super::backend::{ImageBackend, ImagingError};
use super::format::OutputFormat;
use super::params::{Quality, TargetSize};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject rasters with a zero side; every later step assumes both are positive.
fn ensure_non_empty(image: DynamicImage) -> Result<DynamicImage, ImagingError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ImagingError::Decode(format!(
            "decoded image has empty dimensions {}x{}",
            image.width(),
            image.height()
        )));
    }
    Ok(image)
}

/// Resample to exactly `size` with bilinear interpolation.
///
/// The source is normalized to RGBA8 first, so the result is always
/// `DynamicImage::ImageRgba8`. Aspect ratio is not preserved. The output
/// buffer is allocated unchecked; the operations bound `size` with
/// [`check_output_size`](crate::imaging::check_output_size) first.
pub fn resize_fixed(image: &DynamicImage, size: TargetSize) -> DynamicImage {
    let rgba = image.to_rgba8();
    DynamicImage::ImageRgba8(image::imageops::resize(
        &rgba,
        size.width(),
        size.height(),
        FilterType::Triangle,
    ))
}

/// Encode to an in-memory buffer.
fn encode_image(
    image: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, ImagingError> {
    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Jpeg => {
            // Encoder scale starts at 1; quality 0 means "smallest", same as 1
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value().max(1));
            match image.color() {
                ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder),
                // JPEG has no alpha channel and no 16-bit mode
                _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder),
            }
        }
        other => image.write_to(&mut buffer, other.image_format()),
    };
    result.map_err(|e| ImagingError::Encode {
        format,
        message: e.to_string(),
    })?;
    Ok(buffer.into_inner())
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, ImagingError> {
        let image =
            image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;
        ensure_non_empty(image)
    }

    fn decode_jpeg(&self, bytes: &[u8]) -> Result<DynamicImage, ImagingError> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| ImagingError::Decode(format!("not a valid JPEG: {e}")))?;
        ensure_non_empty(image)
    }

    fn resample(&self, image: &DynamicImage, size: TargetSize) -> DynamicImage {
        resize_fixed(image, size)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, ImagingError> {
        encode_image(image, format, quality)
    }
}
