//! Image processing: decode, resample, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Resize** | bilinear (`Triangle`) resample to exact dimensions |
//! | **Scale to fit** | exact-ratio fit inside a box, then resize |
//! | **Ensure fit** | scale to fit, but never enlarge |
//! | **Recompress JPEG** | `JpegEncoder` at a caller-chosen quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Validated quality and size types
//! - **Format**: Extension → encoder lookup table
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Byte-in, byte-out functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod format;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{Dimensions, ErrorKind, ImageBackend, ImagingError};
pub use calculations::{calculate_downscale_dimensions, calculate_fit_dimensions, round_half_even};
pub use format::OutputFormat;
pub use operations::{
    EncodedImage, check_output_size, ensure_image_fits, get_dimensions, recompress_jpeg,
    resize_image, scale_image_to_fit,
};
pub use params::{FitMode, Quality, TargetSize};
pub use rust_backend::RustBackend;
