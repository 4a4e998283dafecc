//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four pixel-level primitives every
//! backend must support: decode (auto-detected), decode as JPEG only,
//! resample, and encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. The high-level [`operations`](super::operations) only talk to the
//! trait, so they can be tested against a recording mock.

use super::format::OutputFormat;
use super::params::{Quality, TargetSize};
use image::DynamicImage;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Unsupported output format: {extension:?}")]
    UnsupportedFormat { extension: String },
    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Failed to encode {format}: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },
}

/// Coarse classification of an [`ImagingError`], for callers that branch on
/// the failure class rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    UnsupportedFormat,
    InvalidParameter,
    Encode,
}

impl ImagingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::Encode { .. } => ErrorKind::Encode,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::UnsupportedFormat => "unsupported-format",
            Self::InvalidParameter => "invalid-parameter",
            Self::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Width and height of a decoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all four primitives so the operations layer
/// stays backend-agnostic.
pub trait ImageBackend {
    /// Decode bytes in any compiled-in format, detected from magic bytes.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, ImagingError>;

    /// Decode bytes strictly as JPEG. No format detection is attempted.
    fn decode_jpeg(&self, bytes: &[u8]) -> Result<DynamicImage, ImagingError>;

    /// Normalize to RGBA8 and resample to exactly `size`.
    fn resample(&self, image: &DynamicImage, size: TargetSize) -> DynamicImage;

    /// Encode a raster in the given format. `quality` only affects JPEG.
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, ImagingError>;
}
