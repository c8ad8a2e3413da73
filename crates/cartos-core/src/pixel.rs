//! Special pixel values
//!
//! Cube samples are `f64`. A handful of reserved bit patterns at the very
//! bottom of the double range mark samples that carry no measurement:
//!
//! | Name | Meaning |
//! |------|---------|
//! | `NULL` | no data |
//! | `LRS`  | low representation saturation |
//! | `LIS`  | low instrument saturation |
//! | `HIS`  | high instrument saturation |
//! | `HRS`  | high representation saturation |
//!
//! Every reserved value is smaller than [`VALID_MIN`], so a single comparison
//! separates measurements from markers.

use std::fmt;
use std::str::FromStr;

/// No data.
pub const NULL: f64 = f64::from_bits(0xFFEF_FFFF_FFFF_FFFF);
/// Low representation saturation.
pub const LRS: f64 = f64::from_bits(0xFFEF_FFFF_FFFF_FFFE);
/// Low instrument saturation.
pub const LIS: f64 = f64::from_bits(0xFFEF_FFFF_FFFF_FFFD);
/// High instrument saturation.
pub const HIS: f64 = f64::from_bits(0xFFEF_FFFF_FFFF_FFFC);
/// High representation saturation.
pub const HRS: f64 = f64::from_bits(0xFFEF_FFFF_FFFF_FFFB);
/// Smallest valid measurement.
pub const VALID_MIN: f64 = f64::from_bits(0xFFEF_FFFF_FFFF_FFFA);
/// Largest valid measurement.
pub const VALID_MAX: f64 = f64::MAX;

/// True for any reserved marker value.
#[inline]
pub fn is_special(v: f64) -> bool {
    v < VALID_MIN || v.is_nan()
}

#[inline]
pub fn is_null(v: f64) -> bool {
    v.to_bits() == NULL.to_bits()
}

/// True for a measurement (not a marker).
#[inline]
pub fn is_valid(v: f64) -> bool {
    !is_special(v)
}

/// True for either high saturation marker.
#[inline]
pub fn is_high(v: f64) -> bool {
    v.to_bits() == HIS.to_bits() || v.to_bits() == HRS.to_bits()
}

/// True for either low saturation marker.
#[inline]
pub fn is_low(v: f64) -> bool {
    v.to_bits() == LIS.to_bits() || v.to_bits() == LRS.to_bits()
}

/// Name of a marker value, or `None` for measurements.
pub fn special_name(v: f64) -> Option<&'static str> {
    let bits = v.to_bits();
    if bits == NULL.to_bits() {
        Some("Null")
    } else if bits == LRS.to_bits() {
        Some("Lrs")
    } else if bits == LIS.to_bits() {
        Some("Lis")
    } else if bits == HIS.to_bits() {
        Some("His")
    } else if bits == HRS.to_bits() {
        Some("Hrs")
    } else {
        None
    }
}

// ============================================================================
// Storage pixel types
// ============================================================================

/// Storage type of a cube's samples.
///
/// Only used to pick the offset of a band-tracking plane and to describe
/// output cubes; samples are always handled as `f64` in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelType {
    UnsignedByte,
    SignedWord,
    UnsignedWord,
    SignedInteger,
    #[default]
    Real,
    Double,
}

impl PixelType {
    /// Value stored in a tracking plane for "first input image". Larger
    /// indices are added to it.
    pub fn tracking_offset(self) -> i64 {
        match self {
            PixelType::UnsignedByte => 1,
            PixelType::SignedWord => -32752,
            PixelType::UnsignedWord => 3,
            PixelType::SignedInteger | PixelType::Real | PixelType::Double => -16_777_215,
        }
    }

    /// Largest index a tracking plane of this type can hold.
    pub fn tracking_capacity(self) -> i64 {
        match self {
            PixelType::UnsignedByte => 254,
            PixelType::SignedWord | PixelType::UnsignedWord => 65_522,
            PixelType::SignedInteger | PixelType::Real | PixelType::Double => 16_777_215,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PixelType::UnsignedByte => "UnsignedByte",
            PixelType::SignedWord => "SignedWord",
            PixelType::UnsignedWord => "UnsignedWord",
            PixelType::SignedInteger => "SignedInteger",
            PixelType::Real => "Real",
            PixelType::Double => "Double",
        };
        f.write_str(s)
    }
}

impl FromStr for PixelType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unsignedbyte" => Ok(PixelType::UnsignedByte),
            "signedword" => Ok(PixelType::SignedWord),
            "unsignedword" => Ok(PixelType::UnsignedWord),
            "signedinteger" => Ok(PixelType::SignedInteger),
            "real" => Ok(PixelType::Real),
            "double" => Ok(PixelType::Double),
            _ => Err(crate::Error::invalid_keyword(
                "Type",
                s,
                "unknown pixel type",
            )),
        }
    }
}
