//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Each takes
//! encoded bytes plus parameters and returns encoded bytes: decode, compute
//! the target geometry, resample, encode. Nothing is cached between calls.

use super::backend::{Dimensions, ImageBackend, ImagingError};
use super::calculations::{calculate_downscale_dimensions, calculate_fit_dimensions};
use super::format::OutputFormat;
use super::params::{FitMode, Quality, TargetSize};
use image::DynamicImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Encoded output of an operation, tagged with its format and pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: OutputFormat,
    pub dimensions: Dimensions,
    pub bytes: Vec<u8>,
}

/// Decode just enough to report the image dimensions.
pub fn get_dimensions(backend: &impl ImageBackend, bytes: &[u8]) -> Result<(u32, u32)> {
    let image = backend.decode(bytes)?;
    Ok((image.width(), image.height()))
}

/// Resize to exactly `size`, ignoring aspect ratio, and encode as `format`.
///
/// JPEG output is written at [`Quality::MAX`].
pub fn resize_image(
    backend: &impl ImageBackend,
    bytes: &[u8],
    size: TargetSize,
    format: OutputFormat,
) -> Result<EncodedImage> {
    let image = backend.decode(bytes)?;
    log::debug!(
        "resize {}x{} -> {}x{} ({format})",
        image.width(),
        image.height(),
        size.width(),
        size.height()
    );
    check_output_size(size)?;
    let resized = backend.resample(&image, size);
    encode(backend, &resized, format, Quality::MAX)
}

/// Scale to the largest size that fits inside `bounds`, preserving aspect ratio.
///
/// Images smaller than the box are enlarged.
pub fn scale_image_to_fit(
    backend: &impl ImageBackend,
    bytes: &[u8],
    bounds: TargetSize,
    format: OutputFormat,
) -> Result<EncodedImage> {
    fit_image(backend, bytes, bounds, format, FitMode::Fill)
}

/// Like [`scale_image_to_fit`], but images already inside `bounds` keep
/// their size and are only re-encoded.
pub fn ensure_image_fits(
    backend: &impl ImageBackend,
    bytes: &[u8],
    bounds: TargetSize,
    format: OutputFormat,
) -> Result<EncodedImage> {
    fit_image(backend, bytes, bounds, format, FitMode::DownscaleOnly)
}

/// Compute the output size for a fit operation without touching pixels.
pub fn plan_fit(original: Dimensions, bounds: TargetSize, mode: FitMode) -> Result<TargetSize> {
    let original = (original.width, original.height);
    let (width, height) = match mode {
        FitMode::Fill => calculate_fit_dimensions(original, bounds.as_tuple()),
        FitMode::DownscaleOnly => calculate_downscale_dimensions(original, bounds.as_tuple()),
    };
    TargetSize::new(width.into(), height.into())
}

fn fit_image(
    backend: &impl ImageBackend,
    bytes: &[u8],
    bounds: TargetSize,
    format: OutputFormat,
    mode: FitMode,
) -> Result<EncodedImage> {
    let image = backend.decode(bytes)?;
    let original = Dimensions::of(&image);
    let size = plan_fit(original, bounds, mode)?;

    if (original.width, original.height) == size.as_tuple() && mode == FitMode::DownscaleOnly {
        log::debug!(
            "{}x{} already fits {}x{}, re-encoding only",
            original.width,
            original.height,
            bounds.width(),
            bounds.height()
        );
        return encode(backend, &image, format, Quality::MAX);
    }

    log::debug!(
        "fit {}x{} into {}x{} -> {}x{} ({format})",
        original.width,
        original.height,
        bounds.width(),
        bounds.height(),
        size.width(),
        size.height()
    );
    check_output_size(size)?;
    let resized = backend.resample(&image, size);
    encode(backend, &resized, format, Quality::MAX)
}

/// Reject a resample whose RGBA8 output would exceed the `image` crate's
/// default allocation limit (512 MiB), the same ceiling decoding runs under.
pub fn check_output_size(size: TargetSize) -> Result<()> {
    let limit = image::Limits::default().max_alloc.unwrap_or(u64::MAX);
    let needed = u64::from(size.width())
        .checked_mul(u64::from(size.height()))
        .and_then(|pixels| pixels.checked_mul(4));
    match needed {
        Some(bytes) if bytes <= limit => Ok(()),
        _ => Err(ImagingError::InvalidParameter {
            name: "size",
            reason: format!(
                "{}x{} RGBA output exceeds the {limit}-byte allocation limit",
                size.width(),
                size.height()
            ),
        }),
    }
}

/// Re-encode a JPEG at `quality` (0-100), keeping its dimensions.
///
/// The input is decoded strictly as JPEG. Decode failures are reported
/// before an out-of-range quality.
pub fn recompress_jpeg(
    backend: &impl ImageBackend,
    bytes: &[u8],
    quality: i64,
) -> Result<EncodedImage> {
    let image = backend.decode_jpeg(bytes)?;
    let quality = Quality::new(quality)?;
    log::debug!(
        "recompress {}x{} JPEG at quality {}",
        image.width(),
        image.height(),
        quality.value()
    );
    encode(backend, &image, OutputFormat::Jpeg, quality)
}

fn encode(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<EncodedImage> {
    let bytes = backend.encode(image, format, quality)?;
    Ok(EncodedImage {
        format,
        dimensions: Dimensions::of(image),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ErrorKind;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn size(width: i64, height: i64) -> TargetSize {
        TargetSize::new(width, height).unwrap()
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![dims(1920, 1080)]);
        assert_eq!(get_dimensions(&backend, b"img").unwrap(), (1920, 1080));
    }

    #[test]
    fn resize_decodes_resamples_and_encodes_at_max_quality() {
        let backend = MockBackend::with_dimensions(vec![dims(800, 600)]);

        let out = resize_image(&backend, b"img", size(123, 45), OutputFormat::Jpeg).unwrap();
        assert_eq!(out.dimensions, dims(123, 45));
        assert_eq!(out.format, OutputFormat::Jpeg);

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::Resample {
                    width: 123,
                    height: 45
                },
                RecordedOp::Encode {
                    format: OutputFormat::Jpeg,
                    quality: 100,
                    width: 123,
                    height: 45
                },
            ]
        );
    }

    #[test]
    fn resize_refuses_oversized_output_before_resampling() {
        let max = i64::from(u32::MAX);
        let backend = MockBackend::with_dimensions(vec![dims(2, 2)]);
        let err = resize_image(&backend, b"img", size(max, max), OutputFormat::Png).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode]);
    }

    #[test]
    fn scale_to_fit_refuses_enlarging_into_huge_box() {
        let backend = MockBackend::with_dimensions(vec![dims(1, 1)]);
        let err = scale_image_to_fit(&backend, b"img", size(100_000, 100_000), OutputFormat::Png)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode]);
    }

    #[test]
    fn output_size_limit_boundary() {
        // 512 MiB of RGBA8 is 134_217_728 pixels
        assert!(check_output_size(size(16_384, 8_192)).is_ok());
        assert!(check_output_size(size(16_384, 8_193)).is_err());
        assert!(check_output_size(size(1, 1)).is_ok());
    }

    #[test]
    fn resize_decode_failure_stops_before_resample() {
        let backend = MockBackend::new();
        let err = resize_image(&backend, b"junk", size(10, 10), OutputFormat::Png).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode]);
    }

    #[test]
    fn scale_to_fit_landscape() {
        let backend = MockBackend::with_dimensions(vec![dims(800, 600)]);
        let out = scale_image_to_fit(&backend, b"img", size(400, 400), OutputFormat::Png).unwrap();
        assert_eq!(out.dimensions, dims(400, 300));
        assert!(backend.get_operations().contains(&RecordedOp::Resample {
            width: 400,
            height: 300
        }));
    }

    #[test]
    fn scale_to_fit_portrait() {
        let backend = MockBackend::with_dimensions(vec![dims(600, 800)]);
        let out = scale_image_to_fit(&backend, b"img", size(400, 400), OutputFormat::Png).unwrap();
        assert_eq!(out.dimensions, dims(300, 400));
    }

    #[test]
    fn scale_to_fit_enlarges_small_images() {
        let backend = MockBackend::with_dimensions(vec![dims(100, 50)]);
        let out =
            scale_image_to_fit(&backend, b"img", size(400, 400), OutputFormat::Bitmap).unwrap();
        assert_eq!(out.dimensions, dims(400, 200));
    }

    #[test]
    fn ensure_fit_skips_resample_when_image_fits() {
        let backend = MockBackend::with_dimensions(vec![dims(100, 50)]);
        let out = ensure_image_fits(&backend, b"img", size(400, 400), OutputFormat::Tiff).unwrap();
        assert_eq!(out.dimensions, dims(100, 50));
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::Encode {
                    format: OutputFormat::Tiff,
                    quality: 100,
                    width: 100,
                    height: 50
                },
            ]
        );
    }

    #[test]
    fn ensure_fit_shrinks_oversized_images() {
        let backend = MockBackend::with_dimensions(vec![dims(1000, 2000)]);
        let out = ensure_image_fits(&backend, b"img", size(400, 400), OutputFormat::Jpeg).unwrap();
        assert_eq!(out.dimensions, dims(200, 400));
    }

    #[test]
    fn plan_fit_modes_differ_only_for_small_images() {
        let bounds = size(400, 400);
        assert_eq!(
            plan_fit(dims(200, 100), bounds, FitMode::Fill).unwrap().as_tuple(),
            (400, 200)
        );
        assert_eq!(
            plan_fit(dims(200, 100), bounds, FitMode::DownscaleOnly)
                .unwrap()
                .as_tuple(),
            (200, 100)
        );
        assert_eq!(
            plan_fit(dims(800, 600), bounds, FitMode::DownscaleOnly)
                .unwrap()
                .as_tuple(),
            (400, 300)
        );
    }

    #[test]
    fn recompress_uses_requested_quality() {
        let backend = MockBackend::with_dimensions(vec![dims(64, 48)]);
        let out = recompress_jpeg(&backend, b"jpeg", 35).unwrap();
        assert_eq!(out.format, OutputFormat::Jpeg);
        assert_eq!(out.dimensions, dims(64, 48));
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::DecodeJpeg,
                RecordedOp::Encode {
                    format: OutputFormat::Jpeg,
                    quality: 35,
                    width: 64,
                    height: 48
                },
            ]
        );
    }

    #[test]
    fn recompress_reports_decode_before_bad_quality() {
        let backend = MockBackend::new();
        let err = recompress_jpeg(&backend, b"junk", 500).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn recompress_rejects_out_of_range_quality_without_encoding() {
        for bad in [-1, 101] {
            let backend = MockBackend::with_dimensions(vec![dims(8, 8)]);
            let err = recompress_jpeg(&backend, b"jpeg", bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
            assert_eq!(backend.get_operations(), vec![RecordedOp::DecodeJpeg]);
        }
    }

    #[test]
    fn recompress_accepts_quality_bounds() {
        for ok in [0, 100] {
            let backend = MockBackend::with_dimensions(vec![dims(8, 8)]);
            assert!(recompress_jpeg(&backend, b"jpeg", ok).is_ok());
        }
    }
}
