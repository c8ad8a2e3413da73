//! Mosaic, overlap and stitch configuration
//!
//! Option structs deserialize with missing fields taking their defaults:
//!
//! ```ignore
//! let options: MosaicOptions = serde_json::from_str(r#"{
//!     "priority": "UseBandPlacementCriteria",
//!     "band": { "Keyword": { "name": "FilterName", "value": "RED" } },
//!     "criteria": "Greater",
//!     "track": true
//! }"#)?;
//! ```

use crate::error::MosaicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn unknown(parameter: &str, value: &str) -> MosaicError {
    MosaicError::Programmer(format!("Unknown value for {parameter} [{value}]"))
}

/// How an input pixel competes with the pixel already in the mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    /// The input overwrites the mosaic
    #[default]
    PlaceImagesOnTop,
    /// The input fills only Null mosaic pixels
    PlaceImagesBeneath,
    /// One band decides, by [`BandCriteria`], which image owns a pixel
    UseBandPlacementCriteria,
    /// Running mean kept with a count plane per band
    AverageImageWithMosaic,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::PlaceImagesOnTop => "PlaceImagesOnTop",
            Priority::PlaceImagesBeneath => "PlaceImagesBeneath",
            Priority::UseBandPlacementCriteria => "UseBandPlacementCriteria",
            Priority::AverageImageWithMosaic => "AverageImageWithMosaic",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placeimagesontop" | "ontop" | "input" => Ok(Priority::PlaceImagesOnTop),
            "placeimagesbeneath" | "beneath" | "mosaic" => Ok(Priority::PlaceImagesBeneath),
            "usebandplacementcriteria" | "band" => Ok(Priority::UseBandPlacementCriteria),
            "averageimagewithmosaic" | "average" => Ok(Priority::AverageImageWithMosaic),
            _ => Err(unknown("PRIORITY", s)),
        }
    }
}

/// Which value wins under [`Priority::UseBandPlacementCriteria`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BandCriteria {
    #[default]
    Lesser,
    Greater,
}

impl fmt::Display for BandCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandCriteria::Lesser => f.write_str("Lesser"),
            BandCriteria::Greater => f.write_str("Greater"),
        }
    }
}

impl FromStr for BandCriteria {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lesser" => Ok(BandCriteria::Lesser),
            "greater" => Ok(BandCriteria::Greater),
            _ => Err(unknown("CRITERIA", s)),
        }
    }
}

/// The band compared under band priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BandSelector {
    /// Original band number, looked up in `BandBin/OriginalBand`
    Number(usize),
    /// The band whose `BandBin` keyword `name` has this value
    Keyword { name: String, value: String },
}

impl Default for BandSelector {
    fn default() -> Self {
        BandSelector::Number(1)
    }
}

impl fmt::Display for BandSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandSelector::Number(n) => write!(f, "{n}"),
            BandSelector::Keyword { name, value } => write!(f, "{name}={value}"),
        }
    }
}

/// Placement rules for [`Mosaic`](crate::Mosaic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicOptions {
    pub priority: Priority,
    pub criteria: BandCriteria,
    pub band: BandSelector,
    /// High saturation input pixels (HRS, HIS) are placed like valid ones
    pub high_saturation: bool,
    /// Low saturation input pixels (LRS, LIS) are placed like valid ones
    pub low_saturation: bool,
    /// Null input pixels are placed like valid ones
    pub null: bool,
    /// Reserve an origin band when creating a mosaic
    pub track: bool,
    /// Require the input `BandBin` group to agree with the mosaic's
    pub match_band_bin: bool,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            priority: Priority::PlaceImagesOnTop,
            criteria: BandCriteria::Lesser,
            band: BandSelector::default(),
            high_saturation: false,
            low_saturation: false,
            null: false,
            track: false,
            match_band_bin: false,
        }
    }
}

/// Overlap enumeration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapOptions {
    /// Record a failed pair in [`OverlapSet::errors`](crate::OverlapSet::errors)
    /// and carry on, instead of failing
    pub continue_after_error: bool,
    /// Maximum number of pair comparisons
    pub max_steps: Option<usize>,
}

impl Default for OverlapOptions {
    fn default() -> Self {
        Self {
            continue_after_error: true,
            max_steps: None,
        }
    }
}

/// Framelet ordering for [`stitch`](crate::stitch::stitch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchOptions {
    /// Flip every framelet top to bottom
    pub geometric_flip: bool,
    /// Place framelets in descending `FrameletNumber` order
    pub time_flip: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_spellings() {
        for p in [
            Priority::PlaceImagesOnTop,
            Priority::PlaceImagesBeneath,
            Priority::UseBandPlacementCriteria,
            Priority::AverageImageWithMosaic,
        ] {
            assert_eq!(p.to_string().parse::<Priority>().unwrap(), p);
        }
        assert_eq!("beneath".parse::<Priority>().unwrap(), Priority::PlaceImagesBeneath);
        assert!("sideways".parse::<Priority>().is_err());
        assert_eq!("GREATER".parse::<BandCriteria>().unwrap(), BandCriteria::Greater);
    }

    #[test]
    fn test_options_from_json() {
        let options: MosaicOptions = serde_json::from_str(
            r#"{
                "priority": "UseBandPlacementCriteria",
                "band": { "Keyword": { "name": "FilterName", "value": "RED" } },
                "criteria": "Greater",
                "track": true
            }"#,
        )
        .unwrap();
        assert_eq!(options.priority, Priority::UseBandPlacementCriteria);
        assert_eq!(options.criteria, BandCriteria::Greater);
        assert!(options.track);
        assert!(!options.match_band_bin);
        assert_eq!(options.band.to_string(), "FilterName=RED");

        let overlap: OverlapOptions = serde_json::from_str("{}").unwrap();
        assert!(overlap.continue_after_error);
        let stitch: StitchOptions = serde_json::from_str(r#"{ "time_flip": true }"#).unwrap();
        assert!(stitch.time_flip && !stitch.geometric_flip);
    }
}
