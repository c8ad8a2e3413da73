//! Latitude type, longitude direction and longitude domain conventions
//!
//! "Universal" coordinates are planetocentric, positive east, 0 to 360.
//! Mapping groups may declare any combination of the conventions below;
//! these helpers convert between them.
//!
//! ```text
//! planetographic = atan(tan(planetocentric) * (a / c)^2)
//! planetocentric = atan(tan(planetographic) * (c / a)^2)
//! local radius   = a*c / sqrt((c cos lat)^2 + (a sin lat)^2)
//! ```

use crate::error::{Error, Result};
use crate::pixel::is_special;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Enumerations
// ============================================================================

/// How latitudes are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum LatitudeType {
    /// Angle from the body centre
    #[default]
    Planetocentric,
    /// Angle of the surface normal
    Planetographic,
}

/// Which way longitudes increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum LongitudeDirection {
    #[default]
    PositiveEast,
    PositiveWest,
}

/// Longitude wrap range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum LongitudeDomain {
    /// -180 to 180
    Domain180,
    /// 0 to 360
    #[default]
    Domain360,
}

impl LongitudeDomain {
    /// Numeric label spelling (180 or 360).
    pub fn degrees(self) -> i32 {
        match self {
            LongitudeDomain::Domain180 => 180,
            LongitudeDomain::Domain360 => 360,
        }
    }

    /// Wrap a longitude into this domain.
    pub fn wrap(self, lon: f64) -> f64 {
        match self {
            LongitudeDomain::Domain180 => to_180_domain(lon),
            LongitudeDomain::Domain360 => to_360_domain(lon),
        }
    }

    /// The other domain.
    pub fn swapped(self) -> Self {
        match self {
            LongitudeDomain::Domain180 => LongitudeDomain::Domain360,
            LongitudeDomain::Domain360 => LongitudeDomain::Domain180,
        }
    }
}

impl fmt::Display for LatitudeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatitudeType::Planetocentric => f.write_str("Planetocentric"),
            LatitudeType::Planetographic => f.write_str("Planetographic"),
        }
    }
}

impl FromStr for LatitudeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("Planetocentric") => Ok(LatitudeType::Planetocentric),
            v if v.eq_ignore_ascii_case("Planetographic") => Ok(LatitudeType::Planetographic),
            _ => Err(Error::invalid_keyword(
                "LatitudeType",
                s,
                "must be [Planetographic or Planetocentric]",
            )),
        }
    }
}

impl fmt::Display for LongitudeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LongitudeDirection::PositiveEast => f.write_str("PositiveEast"),
            LongitudeDirection::PositiveWest => f.write_str("PositiveWest"),
        }
    }
}

impl FromStr for LongitudeDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("PositiveEast") => Ok(LongitudeDirection::PositiveEast),
            v if v.eq_ignore_ascii_case("PositiveWest") => Ok(LongitudeDirection::PositiveWest),
            _ => Err(Error::invalid_keyword(
                "LongitudeDirection",
                s,
                "must be [PositiveWest or PositiveEast]",
            )),
        }
    }
}

impl fmt::Display for LongitudeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

impl FromStr for LongitudeDomain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches(".0") {
            "180" => Ok(LongitudeDomain::Domain180),
            "360" => Ok(LongitudeDomain::Domain360),
            _ => Err(Error::invalid_keyword(
                "LongitudeDomain",
                s,
                "must be [180 or 360]",
            )),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn fuzzy_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}

fn check_latitude(lat: f64, what: &str) -> Result<()> {
    if is_special(lat) || lat.abs() > 90.0 {
        return Err(Error::User(format!(
            "Unable to convert to {what}. The given latitude value [{lat}] is invalid."
        )));
    }
    Ok(())
}

/// Planetocentric to planetographic latitude, degrees.
///
/// # Errors
///
/// Fails for latitudes outside `[-90, 90]`.
pub fn to_planetographic(lat: f64, equatorial_radius: f64, polar_radius: f64) -> Result<f64> {
    let lat = if fuzzy_eq(lat.abs(), 90.0) { lat.round() } else { lat };
    check_latitude(lat, "Planetographic")?;
    if lat.abs() >= 90.0 {
        return Ok(lat);
    }
    let ratio = equatorial_radius / polar_radius;
    Ok((lat.to_radians().tan() * ratio * ratio).atan().to_degrees())
}

/// Planetographic to planetocentric latitude, degrees.
///
/// # Errors
///
/// Fails for latitudes outside `[-90, 90]`.
pub fn to_planetocentric(lat: f64, equatorial_radius: f64, polar_radius: f64) -> Result<f64> {
    check_latitude(lat, "Planetocentric")?;
    if lat.abs() >= 90.0 {
        return Ok(lat);
    }
    let ratio = polar_radius / equatorial_radius;
    Ok((lat.to_radians().tan() * ratio * ratio).atan().to_degrees())
}

/// Wrap a longitude into `[0, 360]`. Values already equal to 0 or 360
/// (within rounding) are kept as they are.
pub fn to_360_domain(lon: f64) -> f64 {
    if (0.0..=360.0).contains(&lon) || fuzzy_eq(lon, 0.0) || fuzzy_eq(lon, 360.0) {
        return lon;
    }
    lon - 360.0 * (lon / 360.0).floor()
}

/// Wrap a longitude into `[-180, 180]`.
pub fn to_180_domain(lon: f64) -> f64 {
    let wrapped = if fuzzy_eq(lon, 360.0) {
        360.0
    } else {
        lon - 360.0 * (lon / 360.0).floor()
    };
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Convert a positive-west longitude to positive east in `domain`.
pub fn to_positive_east(lon: f64, domain: LongitudeDomain) -> f64 {
    domain.wrap(-lon)
}

/// Convert a positive-east longitude to positive west in `domain`.
pub fn to_positive_west(lon: f64, domain: LongitudeDomain) -> f64 {
    domain.wrap(-lon)
}

/// Radius of the spheroid at a planetocentric latitude, same units as the radii.
pub fn local_radius(lat: f64, equatorial_radius: f64, polar_radius: f64) -> f64 {
    let (a, c) = (equatorial_radius, polar_radius);
    if a - c < f64::EPSILON {
        return a;
    }
    let lat = lat.to_radians();
    a * c / ((c * lat.cos()).powi(2) + (a * lat.sin()).powi(2)).sqrt()
}

/// First eccentricity of the spheroid.
pub fn eccentricity(equatorial_radius: f64, polar_radius: f64) -> f64 {
    (1.0 - (polar_radius * polar_radius) / (equatorial_radius * equatorial_radius)).sqrt()
}

/// True when `lon` lies in `[min_lon, max_lon]`, allowing ranges that wrap
/// through 0/360. A range spanning a full 360 degrees contains everything.
pub fn in_longitude_range(min_lon: f64, max_lon: f64, lon: f64) -> bool {
    if fuzzy_eq(max_lon - min_lon, 360.0) {
        return true;
    }
    let mut lon = to_360_domain(lon);
    let mut min = to_360_domain(min_lon);
    let max = to_360_domain(max_lon);
    if min > max {
        if lon > min {
            lon -= 360.0;
        }
        min -= 360.0;
    }
    min <= lon && lon <= max
}

/// True when `lat` lies in `[min_lat, max_lat]`. A 180 degree span contains
/// everything.
pub fn in_latitude_range(min_lat: f64, max_lat: f64, lat: f64) -> bool {
    max_lat - min_lat == 180.0 || (min_lat <= lat && lat <= max_lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARS_EQ: f64 = 3396190.0;
    const MARS_POL: f64 = 3376200.0;

    #[test]
    fn test_domains() {
        assert_eq!(to_360_domain(-10.0), 350.0);
        assert_eq!(to_360_domain(360.0), 360.0);
        assert_eq!(to_360_domain(370.0), 10.0);
        assert_eq!(to_180_domain(190.0), -170.0);
        assert_eq!(to_180_domain(180.0), 180.0);
        assert_eq!(to_180_domain(-190.0), 170.0);
        assert_eq!(to_180_domain(360.0), 0.0);
    }

    #[test]
    fn test_directions() {
        let d360 = LongitudeDomain::Domain360;
        let d180 = LongitudeDomain::Domain180;
        assert_eq!(to_positive_west(10.0, d360), 350.0);
        assert_eq!(to_positive_west(10.0, d180), -10.0);
        assert_eq!(to_positive_east(350.0, d180), 10.0);
    }

    #[test]
    fn test_latitude_types() {
        let g = to_planetographic(45.0, MARS_EQ, MARS_POL).unwrap();
        assert!(g > 45.0);
        let c = to_planetocentric(g, MARS_EQ, MARS_POL).unwrap();
        assert!((c - 45.0).abs() < 1e-12);
        assert_eq!(to_planetographic(90.0, MARS_EQ, MARS_POL).unwrap(), 90.0);
        assert!(to_planetocentric(91.0, MARS_EQ, MARS_POL).is_err());
    }

    #[test]
    fn test_radius() {
        assert_eq!(local_radius(0.0, MARS_EQ, MARS_POL), MARS_EQ);
        assert!((local_radius(90.0, MARS_EQ, MARS_POL) - MARS_POL).abs() < 1e-6);
        assert_eq!(eccentricity(10.0, 10.0), 0.0);
    }

    #[test]
    fn test_ranges() {
        assert!(in_longitude_range(350.0, 370.0, 5.0));
        assert!(in_longitude_range(350.0, 370.0, 355.0));
        assert!(!in_longitude_range(350.0, 370.0, 20.0));
        assert!(in_longitude_range(-180.0, 180.0, 180.0));
        assert!(in_longitude_range(-180.0, 180.0, -180.0));
        assert!(in_latitude_range(-90.0, 90.0, 12.0));
        assert!(!in_latitude_range(-10.0, 10.0, 12.0));
    }

    #[test]
    fn test_parse_display() {
        for s in ["Planetocentric", "Planetographic"] {
            assert_eq!(s.parse::<LatitudeType>().unwrap().to_string(), s);
        }
        assert_eq!("180".parse::<LongitudeDomain>().unwrap(), LongitudeDomain::Domain180);
        assert_eq!(LongitudeDomain::Domain360.to_string(), "360");
        assert!("East".parse::<LongitudeDirection>().is_err());
    }
}
