//! Camera capability interface
//!
//! Sensor models (framing, line scan, push frame, radar, ...) live outside
//! this workspace. The warp, footprint and mapping code sees them only
//! through [`Camera`]: image position to universal ground and back, plus a
//! few geometry hints.
//!
//! After a failed [`Camera::set_image`] or [`Camera::set_universal_ground`]
//! the accessors hold stale values and must not be read until a later call
//! succeeds.

use crate::conventions::{LatitudeType, LongitudeDirection, LongitudeDomain, to_planetographic};
use crate::error::{Error, Result};
use crate::label::{Group, Keyword};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Definitions
// ============================================================================

/// Sensor model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraType {
    Framing,
    LineScan,
    PushFrame,
    Radar,
    Point,
    Csm,
}

impl fmt::Display for CameraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CameraType::Framing => "Framing",
            CameraType::LineScan => "LineScan",
            CameraType::PushFrame => "PushFrame",
            CameraType::Radar => "Radar",
            CameraType::Point => "Point",
            CameraType::Csm => "Csm",
        };
        f.write_str(s)
    }
}

impl FromStr for CameraType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "framing" => Ok(CameraType::Framing),
            "linescan" => Ok(CameraType::LineScan),
            "pushframe" => Ok(CameraType::PushFrame),
            "radar" => Ok(CameraType::Radar),
            "point" => Ok(CameraType::Point),
            "csm" => Ok(CameraType::Csm),
            _ => Err(Error::invalid_keyword("CameraType", s, "unknown camera type")),
        }
    }
}

/// Framelet layout of a push-frame camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushFrameGeometry {
    /// Framelet height in unsummed detector lines
    pub framelet_height: usize,
    /// Line summing factor
    pub line_scale_factor: f64,
    /// Images made of the even framelets start one framelet late
    pub even_framelets: bool,
}

impl PushFrameGeometry {
    /// Framelet height in image lines after summing.
    pub fn frame_size(&self) -> f64 {
        self.framelet_height as f64 / self.line_scale_factor
    }
}

/// Start and end quad sizes for the reverse-driven resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilingHint {
    pub start: usize,
    pub end: usize,
}

impl Default for TilingHint {
    fn default() -> Self {
        Self { start: 128, end: 8 }
    }
}

impl TilingHint {
    /// Validate a tiling hint.
    ///
    /// `(2, 2)` means "no hint". Otherwise `start` must be a power of two of
    /// at least 4 and `end` a smaller power of two, at least 2.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Programmer`] for inconsistent sizes.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start == 2 && end == 2 {
            return Ok(Self { start, end });
        }
        if end > start {
            return Err(Error::Programmer(
                "Tiling hint end size must be smaller than the start size".into(),
            ));
        }
        if start < 4 {
            return Err(Error::Programmer(
                "Tiling hint start size must be at least 4".into(),
            ));
        }
        if !start.is_power_of_two() {
            return Err(Error::Programmer(
                "Tiling hint start size must be a power of 2".into(),
            ));
        }
        if !end.is_power_of_two() || end < 2 || end >= start {
            return Err(Error::Programmer(
                "Tiling hint end size must be a power of 2 less than the start size".into(),
            ));
        }
        Ok(Self { start, end })
    }
}

/// The body a camera looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    /// Metres
    pub equatorial_radius: f64,
    /// Metres
    pub polar_radius: f64,
}

impl Target {
    pub fn new(name: impl Into<String>, equatorial_radius: f64, polar_radius: f64) -> Self {
        Self {
            name: name.into(),
            equatorial_radius,
            polar_radius,
        }
    }

    /// A spherical body.
    pub fn sphere(name: impl Into<String>, radius: f64) -> Self {
        Self::new(name, radius, radius)
    }
}

/// Raw extent of everything a camera sees, in universal coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSurvey {
    pub min_lat: f64,
    pub max_lat: f64,
    /// 0 to 360 domain
    pub min_lon: f64,
    pub max_lon: f64,
    /// -180 to 180 domain
    pub min_lon180: f64,
    pub max_lon180: f64,
    /// Finest pixel resolution seen, metres
    pub min_res: f64,
    /// Coarsest pixel resolution seen, metres
    pub max_res: f64,
}

impl GroundSurvey {
    fn empty() -> Self {
        Self {
            min_lat: f64::MAX,
            max_lat: f64::MIN,
            min_lon: f64::MAX,
            max_lon: f64::MIN,
            min_lon180: f64::MAX,
            max_lon180: f64::MIN,
            min_res: f64::MAX,
            max_res: f64::MIN,
        }
    }

    fn include(&mut self, lat: f64, lon: f64, res: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        let lon180 = if lon > 180.0 { lon - 360.0 } else { lon };
        self.min_lon180 = self.min_lon180.min(lon180);
        self.max_lon180 = self.max_lon180.max(lon180);
        self.include_resolution(res);
    }

    fn include_resolution(&mut self, res: f64) {
        if res > 0.0 {
            self.min_res = self.min_res.min(res);
            self.max_res = self.max_res.max(res);
        }
    }

    fn full_longitude(&mut self) {
        self.min_lon = 0.0;
        self.max_lon = 360.0;
        self.min_lon180 = -180.0;
        self.max_lon180 = 180.0;
    }

    fn is_empty(&self) -> bool {
        self.min_lat == f64::MAX
            || self.max_lat == f64::MIN
            || self.min_lon == f64::MAX
            || self.max_lon == f64::MIN
    }

    /// Express the survey in a mapping group's conventions.
    ///
    /// Radii come from the mapping when present, otherwise from `target`.
    pub fn range_for(&self, mapping: &Group, target: &Target) -> Result<GroundRange> {
        let a = match mapping.find_keyword("EquatorialRadius") {
            Some(k) => k.as_f64()?,
            None => target.equatorial_radius,
        };
        let c = match mapping.find_keyword("PolarRadius") {
            Some(k) => k.as_f64()?,
            None => target.polar_radius,
        };

        let mut min_lat = self.min_lat;
        let mut max_lat = self.max_lat;
        let lat_type = match mapping.find_keyword("LatitudeType") {
            Some(k) => k.text().parse()?,
            None => LatitudeType::Planetocentric,
        };
        if lat_type == LatitudeType::Planetographic {
            min_lat = to_planetographic(min_lat, a, c)?;
            max_lat = to_planetographic(max_lat, a, c)?;
        }

        let domain = match mapping.find_keyword("LongitudeDomain") {
            Some(k) => k.text().parse()?,
            None => LongitudeDomain::Domain360,
        };
        let (mut min_lon, mut max_lon) = match domain {
            LongitudeDomain::Domain360 => (self.min_lon, self.max_lon),
            LongitudeDomain::Domain180 => (self.min_lon180, self.max_lon180),
        };

        let direction = match mapping.find_keyword("LongitudeDirection") {
            Some(k) => k.text().parse()?,
            None => LongitudeDirection::PositiveEast,
        };
        if direction == LongitudeDirection::PositiveWest {
            let swap = min_lon;
            min_lon = -max_lon;
            max_lon = -swap;
        }

        let (low, high) = match domain {
            LongitudeDomain::Domain360 => (0.0, 360.0),
            LongitudeDomain::Domain180 => (-180.0, 180.0),
        };
        while min_lon < low {
            min_lon += 360.0;
            max_lon += 360.0;
        }
        while min_lon > high {
            min_lon -= 360.0;
            max_lon -= 360.0;
        }

        Ok(GroundRange {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            crosses_seam: max_lon - min_lon > 359.0,
        })
    }
}

/// Ground range expressed in a mapping's conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundRange {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    /// The image straddles the longitude domain boundary
    pub crosses_seam: bool,
}

// ============================================================================
// Camera trait
// ============================================================================

/// Sensor model capabilities used by the cartography engine.
pub trait Camera {
    fn samples(&self) -> usize;
    fn lines(&self) -> usize;
    fn bands(&self) -> usize;

    /// Intersect the ray through an image position with the target.
    fn set_image(&mut self, sample: f64, line: f64) -> bool;

    /// Find the image position viewing a universal ground point.
    fn set_universal_ground(&mut self, lat: f64, lon: f64) -> bool;

    /// Planetocentric latitude of the last intersection.
    fn universal_latitude(&self) -> f64;

    /// Positive east 0..360 longitude of the last intersection.
    fn universal_longitude(&self) -> f64;

    fn sample(&self) -> f64;
    fn line(&self) -> f64;

    /// Ground size of one pixel at the last intersection, metres.
    fn pixel_resolution(&self) -> f64;

    fn phase_angle(&self) -> f64;
    fn emission_angle(&self) -> f64;
    fn incidence_angle(&self) -> f64;

    fn camera_type(&self) -> CameraType;
    fn target(&self) -> &Target;

    /// False when each band has its own geometry.
    fn is_band_independent(&self) -> bool {
        true
    }

    fn band(&self) -> usize {
        1
    }

    fn set_band(&mut self, _band: usize) {}

    fn geometric_tiling_hint(&self) -> TilingHint {
        TilingHint::default()
    }

    /// Framelet layout, push-frame cameras only.
    fn push_frame_geometry(&self) -> Option<PushFrameGeometry> {
        None
    }

    /// Universal lat/lon directly below the spacecraft, if known.
    fn sub_spacecraft_point(&self) -> Option<(f64, f64)> {
        None
    }

    /// Ring-plane radius of the last intersection, metres. `None` unless the
    /// camera targets a ring plane; the ring longitude is then
    /// [`universal_longitude`](Camera::universal_longitude).
    fn ring_radius(&self) -> Option<f64> {
        None
    }

    /// Find the image position viewing a ring-plane point (counterclockwise
    /// longitude, 0 to 360).
    fn set_ring_ground(&mut self, _radius: f64, _lon: f64) -> bool {
        false
    }

    /// True when the last `set_universal_ground` landed inside the image.
    fn in_image(&self) -> bool {
        let (s, l) = (self.sample(), self.line());
        s >= 0.5 && l >= 0.5 && s <= self.samples() as f64 + 0.5 && l <= self.lines() as f64 + 0.5
    }

    /// Walk the image edges and record the universal extent and resolution.
    ///
    /// Every band is walked unless the camera is band independent. Poles
    /// that project inside the image extend the latitude range to them and
    /// the longitude range to the full circle, as does either longitude
    /// seam passing through the image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraMissedTarget`] if no edge pixel intersects.
    fn ground_survey(&mut self) -> Result<GroundSurvey> {
        let mut survey = GroundSurvey::empty();
        let original_band = self.band();
        let (ns, nl) = (self.samples(), self.lines());
        let last_band = if self.is_band_independent() { 1 } else { self.bands() };

        for band in 1..=last_band {
            self.set_band(band);
            for line in 1..=nl + 1 {
                let edge_row = line == 1 || line == nl + 1;
                let y = line as f64 - 0.5;
                let mut first_hit = ns + 1;
                for samp in 1..=ns + 1 {
                    if self.set_image(samp as f64 - 0.5, y) {
                        survey.include(
                            self.universal_latitude(),
                            self.universal_longitude(),
                            self.pixel_resolution(),
                        );
                        if !edge_row {
                            first_hit = samp;
                            break;
                        }
                    }
                }
                if edge_row || first_hit >= ns + 1 {
                    continue;
                }
                for samp in (1..=ns + 1).rev() {
                    if self.set_image(samp as f64 - 0.5, y) {
                        survey.include(
                            self.universal_latitude(),
                            self.universal_longitude(),
                            self.pixel_resolution(),
                        );
                        break;
                    }
                }
            }

            if let Some((lat, lon)) = self.sub_spacecraft_point() {
                if self.set_universal_ground(lat, lon) && self.in_image() {
                    survey.include_resolution(self.pixel_resolution());
                }
            }

            if self.set_universal_ground(90.0, 0.0) && self.in_image() {
                survey.max_lat = 90.0;
                survey.full_longitude();
            }
            if self.set_universal_ground(-90.0, 0.0) && self.in_image() {
                survey.min_lat = -90.0;
                survey.full_longitude();
            }

            if !survey.is_empty() {
                let step = (survey.max_lat - survey.min_lat) / 10.0;
                let mut lat = survey.min_lat;
                while lat <= survey.max_lat {
                    if self.set_universal_ground(lat, 0.0) && self.in_image() {
                        survey.min_lon = 0.0;
                        survey.max_lon = 360.0;
                        break;
                    }
                    if self.set_universal_ground(lat, 180.0) && self.in_image() {
                        survey.min_lon180 = -180.0;
                        survey.max_lon180 = 180.0;
                        break;
                    }
                    if step <= 0.0 {
                        break;
                    }
                    lat += step;
                }
            }
        }
        self.set_band(original_band);

        if survey.is_empty() {
            return Err(Error::CameraMissedTarget);
        }
        tracing::debug!(
            min_lat = survey.min_lat,
            max_lat = survey.max_lat,
            min_lon = survey.min_lon,
            max_lon = survey.max_lon,
            min_res = survey.min_res,
            "camera ground survey"
        );
        Ok(survey)
    }

    /// Ground range in a mapping group's conventions.
    fn ground_range(&mut self, mapping: &Group) -> Result<GroundRange> {
        let survey = self.ground_survey()?;
        survey.range_for(mapping, self.target())
    }

    /// True when the image straddles the longitude domain boundary of the
    /// mapping's conventions.
    fn intersects_longitude_domain(&mut self, mapping: &Group) -> Result<bool> {
        Ok(self.ground_range(mapping)?.crosses_seam)
    }

    /// A sinusoidal mapping group covering the image at its finest resolution.
    fn basic_mapping(&mut self) -> Result<Group> {
        let survey = self.ground_survey()?;
        let target = self.target().clone();
        let mut map = Group::new("Mapping");
        map.set(Keyword::new("TargetName", target.name.as_str()));
        map.set(Keyword::new("EquatorialRadius", target.equatorial_radius).with_unit("meters"));
        map.set(Keyword::new("PolarRadius", target.polar_radius).with_unit("meters"));
        map.set(Keyword::new("LatitudeType", "Planetocentric"));
        map.set(Keyword::new("LongitudeDirection", "PositiveEast"));
        map.set(Keyword::new("LongitudeDomain", 360));
        map.set(Keyword::new("MinimumLatitude", survey.min_lat));
        map.set(Keyword::new("MaximumLatitude", survey.max_lat));
        map.set(Keyword::new("MinimumLongitude", survey.min_lon));
        map.set(Keyword::new("MaximumLongitude", survey.max_lon));
        map.set(Keyword::new("PixelResolution", survey.min_res));
        map.set(Keyword::new("ProjectionName", "Sinusoidal"));
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// lat = line offset, lon = sample offset, on a sphere.
    struct GridCamera {
        target: Target,
        lon0: f64,
        lat0: f64,
        ns: usize,
        nl: usize,
        s: f64,
        l: f64,
        lat: f64,
        lon: f64,
    }

    impl GridCamera {
        fn new(lon0: f64, lat0: f64, ns: usize, nl: usize) -> Self {
            Self {
                target: Target::sphere("Test", 1000.0),
                lon0,
                lat0,
                ns,
                nl,
                s: 0.0,
                l: 0.0,
                lat: 0.0,
                lon: 0.0,
            }
        }
    }

    impl Camera for GridCamera {
        fn samples(&self) -> usize {
            self.ns
        }
        fn lines(&self) -> usize {
            self.nl
        }
        fn bands(&self) -> usize {
            1
        }
        fn set_image(&mut self, sample: f64, line: f64) -> bool {
            self.s = sample;
            self.l = line;
            self.lat = self.lat0 - (line - 0.5);
            self.lon = (self.lon0 + (sample - 0.5)).rem_euclid(360.0);
            self.lat.abs() <= 90.0
        }
        fn set_universal_ground(&mut self, lat: f64, lon: f64) -> bool {
            let mut dl = lon - self.lon0;
            if dl < 0.0 {
                dl += 360.0;
            }
            self.s = dl + 0.5;
            self.l = self.lat0 - lat + 0.5;
            self.lat = lat;
            self.lon = lon;
            true
        }
        fn universal_latitude(&self) -> f64 {
            self.lat
        }
        fn universal_longitude(&self) -> f64 {
            self.lon
        }
        fn sample(&self) -> f64 {
            self.s
        }
        fn line(&self) -> f64 {
            self.l
        }
        fn pixel_resolution(&self) -> f64 {
            1000.0_f64.to_radians()
        }
        fn phase_angle(&self) -> f64 {
            0.0
        }
        fn emission_angle(&self) -> f64 {
            0.0
        }
        fn incidence_angle(&self) -> f64 {
            0.0
        }
        fn camera_type(&self) -> CameraType {
            CameraType::Framing
        }
        fn target(&self) -> &Target {
            &self.target
        }
    }

    #[test]
    fn test_tiling_hint_validation() {
        assert!(TilingHint::new(2, 2).is_ok());
        assert!(TilingHint::new(128, 8).is_ok());
        assert!(TilingHint::new(8, 16).is_err());
        assert!(TilingHint::new(12, 4).is_err());
        assert!(TilingHint::new(2, 1).is_err());
    }

    #[test]
    fn test_ground_range_simple() {
        let mut cam = GridCamera::new(10.0, 20.0, 10, 10);
        let mut map = Group::new("Mapping");
        let range = cam.ground_range(&map).unwrap();
        assert_eq!(range.min_lon, 10.0);
        assert_eq!(range.max_lon, 20.0);
        assert_eq!(range.max_lat, 20.0);
        assert_eq!(range.min_lat, 10.0);
        assert!(!range.crosses_seam);

        map.set(Keyword::new("LongitudeDirection", "PositiveWest"));
        let west = cam.ground_range(&map).unwrap();
        assert_eq!(west.min_lon, 340.0);
        assert_eq!(west.max_lon, 350.0);
    }

    #[test]
    fn test_seam_detection() {
        let mut cam = GridCamera::new(355.0, 5.0, 10, 10);
        let map360 = Group::new("Mapping");
        assert!(cam.intersects_longitude_domain(&map360).unwrap());

        let mut map180 = Group::new("Mapping");
        map180.set(Keyword::new("LongitudeDomain", 180));
        let range = cam.ground_range(&map180).unwrap();
        assert!(!range.crosses_seam);
        assert_eq!(range.min_lon, -5.0);
        assert_eq!(range.max_lon, 5.0);
    }

    #[test]
    fn test_basic_mapping() {
        let mut cam = GridCamera::new(10.0, 20.0, 4, 4);
        let map = cam.basic_mapping().unwrap();
        assert_eq!(map.text("ProjectionName").unwrap(), "Sinusoidal");
        assert_eq!(map.f64("MinimumLongitude").unwrap(), 10.0);
        assert!(map.f64("PixelResolution").unwrap() > 0.0);
    }
}
