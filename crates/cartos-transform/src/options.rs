//! Warp configuration
//!
//! All option structs deserialize with missing fields taking their
//! defaults, so a JSON document only needs the fields it changes:
//!
//! ```ignore
//! let options: Cam2MapOptions = serde_json::from_str(r#"{
//!     "warp": { "interpolation": "NearestNeighbor", "trim": true },
//!     "lon_seam": "Error"
//! }"#)?;
//! ```

use crate::error::TransformError;
use crate::interpolator::Interpolator;
use crate::transform::DEFAULT_OCCLUSION_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn unknown(parameter: &str, value: &str) -> TransformError {
    TransformError::UnknownOption {
        parameter: parameter.to_string(),
        value: value.to_string(),
    }
}

/// Resampling strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WarpAlgorithm {
    /// Chosen from the camera type
    #[default]
    Automatic,
    ForwardPatch,
    ReversePatch,
}

impl fmt::Display for WarpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarpAlgorithm::Automatic => f.write_str("Automatic"),
            WarpAlgorithm::ForwardPatch => f.write_str("ForwardPatch"),
            WarpAlgorithm::ReversePatch => f.write_str("ReversePatch"),
        }
    }
}

impl FromStr for WarpAlgorithm {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automatic" | "auto" => Ok(WarpAlgorithm::Automatic),
            "forwardpatch" | "forward" => Ok(WarpAlgorithm::ForwardPatch),
            "reversepatch" | "reverse" => Ok(WarpAlgorithm::ReversePatch),
            _ => Err(unknown("WARPALGORITHM", s)),
        }
    }
}

/// Options shared by every camera warp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpOptions {
    pub algorithm: WarpAlgorithm,
    pub interpolation: Interpolator,
    /// Null output pixels whose ground point is outside the mapping's
    /// ground range
    pub trim: bool,
    /// Null output pixels the camera cannot see (reverse strategies)
    pub occlusion: bool,
    /// Degrees
    pub occlusion_tolerance: f64,
    /// Patch size for a forced forward or reverse patch strategy
    pub patch_size: Option<usize>,
    /// `[start, end]` quad sizes overriding the camera's tiling hint
    pub tiling: Option<[usize; 2]>,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            algorithm: WarpAlgorithm::Automatic,
            interpolation: Interpolator::default(),
            trim: false,
            occlusion: false,
            occlusion_tolerance: DEFAULT_OCCLUSION_TOLERANCE,
            patch_size: None,
            tiling: None,
        }
    }
}

/// Where the output ground range comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangeMode {
    /// The camera's ground range
    Camera,
    /// The user's mapping group
    Map,
    /// The camera's ground range, with the output sized to exactly what
    /// the camera sees
    #[default]
    Minimize,
}

impl fmt::Display for RangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeMode::Camera => f.write_str("Camera"),
            RangeMode::Map => f.write_str("Map"),
            RangeMode::Minimize => f.write_str("Minimize"),
        }
    }
}

impl FromStr for RangeMode {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camera" => Ok(RangeMode::Camera),
            "map" => Ok(RangeMode::Map),
            "minimize" => Ok(RangeMode::Minimize),
            _ => Err(unknown("DEFAULTRANGE", s)),
        }
    }
}

/// Where the output pixel resolution comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ResolutionMode {
    /// The camera's finest resolution
    #[default]
    Camera,
    /// `PixelResolution` or `Scale` of the user's mapping group
    Map,
    /// Metres per pixel
    Mpp(f64),
    /// Pixels per degree
    Ppd(f64),
}

/// What to do when the image straddles the longitude domain seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LonSeam {
    /// Switch between the 360 and 180 domains when that avoids the seam
    #[default]
    Auto,
    /// Fail
    Error,
    /// Project anyway
    Continue,
}

impl fmt::Display for LonSeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LonSeam::Auto => f.write_str("Auto"),
            LonSeam::Error => f.write_str("Error"),
            LonSeam::Continue => f.write_str("Continue"),
        }
    }
}

impl FromStr for LonSeam {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(LonSeam::Auto),
            "error" => Ok(LonSeam::Error),
            "continue" => Ok(LonSeam::Continue),
            _ => Err(unknown("LONSEAM", s)),
        }
    }
}

/// Explicit ground range keywords, each overriding its default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeOverrides {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lon: Option<f64>,
    pub max_lon: Option<f64>,
}

impl RangeOverrides {
    /// `(keyword, value)` for every override given.
    pub fn keywords(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("MinimumLatitude", self.min_lat),
            ("MaximumLatitude", self.max_lat),
            ("MinimumLongitude", self.min_lon),
            ("MaximumLongitude", self.max_lon),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }

    pub fn has_longitudes(&self) -> bool {
        self.min_lon.is_some() || self.max_lon.is_some()
    }
}

/// Camera to map projection options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cam2MapOptions {
    pub warp: WarpOptions,
    pub default_range: RangeMode,
    pub resolution: ResolutionMode,
    pub lon_seam: LonSeam,
    pub range: RangeOverrides,
}

/// Where a reprojected map's ground range comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceRange {
    /// The input map's range, converted to the output conventions
    #[default]
    From,
    /// The user's mapping group
    Map,
}

impl FromStr for SourceRange {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "from" => Ok(SourceRange::From),
            "map" => Ok(SourceRange::Map),
            _ => Err(unknown("DEFAULTRANGE", s)),
        }
    }
}

/// Where a reprojected map's resolution comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SourceResolution {
    /// The input map's resolution
    #[default]
    From,
    /// The user's mapping group
    Map,
    /// Metres per pixel
    Mpp(f64),
    /// Pixels per degree
    Ppd(f64),
}

/// Map to map reprojection options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Map2MapOptions {
    pub interpolation: Interpolator,
    pub trim: bool,
    pub default_range: SourceRange,
    pub resolution: SourceResolution,
    pub range: RangeOverrides,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let options: Cam2MapOptions = serde_json::from_str(
            r#"{ "warp": { "interpolation": "NearestNeighbor" }, "lon_seam": "Error" }"#,
        )
        .unwrap();
        assert_eq!(options.warp.interpolation, Interpolator::NearestNeighbor);
        assert_eq!(options.warp.occlusion_tolerance, 1e-5);
        assert_eq!(options.lon_seam, LonSeam::Error);
        assert_eq!(options.default_range, RangeMode::Minimize);
        assert_eq!(options.resolution, ResolutionMode::Camera);
    }

    #[test]
    fn test_resolution_value_in_json() {
        let options: Map2MapOptions =
            serde_json::from_str(r#"{ "resolution": { "Ppd": 4.0 }, "range": { "min_lat": -5.0 } }"#)
                .unwrap();
        assert_eq!(options.resolution, SourceResolution::Ppd(4.0));
        assert_eq!(
            options.range.keywords().collect::<Vec<_>>(),
            vec![("MinimumLatitude", -5.0)]
        );
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "ForwardPatch".parse::<WarpAlgorithm>().unwrap(),
            WarpAlgorithm::ForwardPatch
        );
        assert_eq!("minimize".parse::<RangeMode>().unwrap(), RangeMode::Minimize);
        assert_eq!("CONTINUE".parse::<LonSeam>().unwrap(), LonSeam::Continue);
        let err = "sideways".parse::<WarpAlgorithm>().unwrap_err();
        assert_eq!(err.kind(), cartos_core::ErrorKind::Programmer);
        assert_eq!(
            err.to_string(),
            "Unknown value for WARPALGORITHM [sideways]"
        );
    }
}
