//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They validate on
//! construction, so anything holding a [`Quality`] or [`TargetSize`] is known
//! to be in range. Invalid values are rejected, never clamped.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality, 0–100 inclusive.
//! - [`TargetSize`]: positive width and height, either exact output size or a bounding box.
//! - [`FitMode`]: whether scale-to-fit may enlarge images smaller than the box.

use super::backend::ImagingError;

/// Quality setting for lossy JPEG encoding (0-100).
///
/// 0 is the smallest/worst output, 100 the largest/best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    /// Quality used by the resize and scale paths.
    pub const MAX: Quality = Quality(100);

    pub fn new(value: i64) -> Result<Self, ImagingError> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ImagingError::InvalidParameter {
                name: "quality",
                reason: format!("must be 0-100, got {value}"),
            })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// A validated pair of positive pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    width: u32,
    height: u32,
}

impl TargetSize {
    pub fn new(width: i64, height: i64) -> Result<Self, ImagingError> {
        Ok(Self {
            width: positive_dimension("width", width)?,
            height: positive_dimension("height", height)?,
        })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn positive_dimension(name: &'static str, value: i64) -> Result<u32, ImagingError> {
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ImagingError::InvalidParameter {
            name,
            reason: format!("must be a positive pixel count, got {value}"),
        }),
    }
}

/// How scale-to-fit treats images that already fit inside the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Always scale so that one side touches the box, enlarging if needed.
    #[default]
    Fill,
    /// Only ever shrink; images already inside the box keep their size.
    DownscaleOnly,
}
