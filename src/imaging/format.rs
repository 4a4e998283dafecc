//! Output format selection from file extensions.
//!
//! The mapping is a fixed lookup table. Matching is exact and
//! case-sensitive: `.jpg` selects JPEG, `.JPG` is unsupported. Callers that
//! want to accept uppercase extensions must normalize before lookup.

use super::backend::ImagingError;
use image::ImageFormat;
use std::fmt;
use std::path::Path;

/// Formats the resize and scale paths can encode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Bitmap,
    Tiff,
}

/// Extension (with leading dot) → encoder.
const EXTENSIONS: &[(&str, OutputFormat)] = &[
    (".jpeg", OutputFormat::Jpeg),
    (".jpg", OutputFormat::Jpeg),
    (".png", OutputFormat::Png),
    (".bmp", OutputFormat::Bitmap),
    (".tif", OutputFormat::Tiff),
    (".tiff", OutputFormat::Tiff),
];

impl OutputFormat {
    /// Look up the format for an extension such as `".png"`.
    pub fn from_extension(extension: &str) -> Result<Self, ImagingError> {
        EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, format)| *format)
            .ok_or_else(|| ImagingError::UnsupportedFormat {
                extension: extension.to_string(),
            })
    }

    /// Look up the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ImagingError> {
        Self::from_extension(&extension_of(path))
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Bitmap => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Bitmap => "BMP",
            Self::Tiff => "TIFF",
        };
        f.write_str(name)
    }
}

/// Extension of `path` with a leading dot, or `""` when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Every extension the lookup table accepts.
pub fn supported_output_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSIONS.iter().map(|(ext, _)| *ext)
}
