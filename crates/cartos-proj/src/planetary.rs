//! Latitude/longitude map projections
//!
//! A [`TProjection`] turns a ground position into projection coordinates
//! and back. Shared bookkeeping (radii, conventions, ground range, current
//! position, world mapper) lives in [`ProjectionState`]; a concrete
//! projection only supplies the pure `project`/`unproject` formulas.
//!
//! Positions passed to `set_ground` and returned by `latitude`/`longitude`
//! are in the mapping group's own conventions. The `universal_*` family is
//! always planetocentric, positive east, 0 to 360.

use crate::error::{ProjectionError, ProjectionResult};
use crate::world::WorldMapper;
use cartos_core::conventions::{
    in_latitude_range, in_longitude_range, local_radius, to_planetocentric, to_planetographic,
    to_positive_west,
};
use cartos_core::pixel::is_special;
use cartos_core::{
    Error, Group, Keyword, Label, LatitudeType, LongitudeDirection, LongitudeDomain, Result, Value,
};
use std::f64::consts::PI;

/// Step of the ground-range border walk, degrees.
const XY_RANGE_STEP: f64 = 0.01;

/// Keywords every planetary mapping group reports, in output order.
const CANONICAL_KEYWORDS: [&str; 16] = [
    "TargetName",
    "ProjectionName",
    "EquatorialRadius",
    "PolarRadius",
    "LatitudeType",
    "LongitudeDirection",
    "LongitudeDomain",
    "PixelResolution",
    "Scale",
    "UpperLeftCornerX",
    "UpperLeftCornerY",
    "MinimumLatitude",
    "MaximumLatitude",
    "MinimumLongitude",
    "MaximumLongitude",
    "Rotation",
];

// ============================================================================
// Ranges
// ============================================================================

/// Ground range in the mapping group's conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonRange {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl LatLonRange {
    pub fn mid_latitude(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    pub fn mid_longitude(&self) -> f64 {
        (self.min_lon + self.max_lon) / 2.0
    }
}

/// Extent of projection coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XYRange {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl XYRange {
    /// A range containing nothing; the first `include` sets all four bounds.
    pub fn empty() -> Self {
        Self {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_y: f64::MAX,
            max_y: f64::MIN,
        }
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// At least one point was included.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}

// ============================================================================
// State
// ============================================================================

/// Parameters and current position shared by all planetary projections.
#[derive(Debug, Clone)]
pub struct ProjectionState {
    mapping: Group,
    equatorial_radius: f64,
    polar_radius: f64,
    eccentricity: f64,
    latitude_type: LatitudeType,
    longitude_direction: LongitudeDirection,
    longitude_domain: LongitudeDomain,
    ground_range: Option<LatLonRange>,
    rotation: f64,
    mapper: Option<WorldMapper>,
    good: bool,
    x: f64,
    y: f64,
    latitude: f64,
    longitude: f64,
}

/// Read a text keyword, inserting `default` when it is absent and defaults
/// are allowed.
pub(crate) fn text_or_default(
    mapping: &mut Group,
    name: &str,
    default: Value,
    allow_defaults: bool,
) -> Result<String> {
    if let Some(k) = mapping.find_keyword(name) {
        return Ok(k.text());
    }
    if !allow_defaults {
        return Err(Error::missing_keyword("Mapping", name));
    }
    let text = default.to_string();
    mapping.set(Keyword::new(name, default));
    Ok(text)
}

/// Read a numeric keyword, inserting `default` (when there is one) if the
/// keyword is absent and defaults are allowed.
pub(crate) fn f64_or_default(
    mapping: &mut Group,
    name: &str,
    default: Option<f64>,
    allow_defaults: bool,
) -> Result<f64> {
    if let Some(k) = mapping.find_keyword(name) {
        return k.as_f64();
    }
    match default {
        Some(value) if allow_defaults => {
            mapping.set(Keyword::new(name, value).with_unit("degrees"));
            Ok(value)
        }
        _ => Err(Error::missing_keyword("Mapping", name)),
    }
}

impl ProjectionState {
    /// Parse the `Mapping` group of a label.
    ///
    /// With `allow_defaults`, missing convention keywords are filled in
    /// (`Planetocentric`, `PositiveEast`, `360`) and written back into the
    /// stored group.
    ///
    /// # Errors
    ///
    /// Any failure is reported as [`ProjectionError::InvalidMapping`].
    pub fn from_label(label: &Label, allow_defaults: bool) -> ProjectionResult<Self> {
        let mapping = label.mapping().map_err(ProjectionError::mapping)?;
        Self::from_mapping(mapping, allow_defaults)
    }

    /// Parse a mapping group directly.
    pub fn from_mapping(mut mapping: Group, allow_defaults: bool) -> ProjectionResult<Self> {
        Self::parse(&mut mapping, allow_defaults)
            .map(|mut state| {
                state.mapping = mapping;
                state
            })
            .map_err(ProjectionError::mapping)
    }

    fn parse(mapping: &mut Group, allow_defaults: bool) -> Result<Self> {
        let equatorial_radius = mapping.f64("EquatorialRadius")?;
        let polar_radius = mapping.f64("PolarRadius")?;
        if equatorial_radius <= 0.0 {
            return Err(Error::invalid_keyword(
                "EquatorialRadius",
                equatorial_radius,
                "must be greater than zero",
            ));
        }
        if polar_radius <= 0.0 {
            return Err(Error::invalid_keyword(
                "PolarRadius",
                polar_radius,
                "must be greater than zero",
            ));
        }
        if polar_radius > equatorial_radius {
            return Err(Error::invalid_keyword(
                "PolarRadius",
                polar_radius,
                "must not exceed [EquatorialRadius]",
            ));
        }

        let latitude_type: LatitudeType = text_or_default(
            mapping,
            "LatitudeType",
            Value::from("Planetocentric"),
            allow_defaults,
        )?
        .parse()?;
        let longitude_direction: LongitudeDirection = text_or_default(
            mapping,
            "LongitudeDirection",
            Value::from("PositiveEast"),
            allow_defaults,
        )?
        .parse()?;
        let longitude_domain: LongitudeDomain =
            text_or_default(mapping, "LongitudeDomain", Value::from(360), allow_defaults)?
                .parse()?;

        let ground_range = read_ground_range(mapping)?;
        let rotation = match mapping.find_keyword("Rotation") {
            Some(k) => k.as_f64()?,
            None => 0.0,
        };

        Ok(Self {
            mapping: Group::new("Mapping"),
            equatorial_radius,
            polar_radius,
            eccentricity: cartos_core::conventions::eccentricity(equatorial_radius, polar_radius),
            latitude_type,
            longitude_direction,
            longitude_domain,
            ground_range,
            rotation,
            mapper: None,
            good: false,
            x: 0.0,
            y: 0.0,
            latitude: 0.0,
            longitude: 0.0,
        })
    }

    /// The mapping group as parsed, including any defaults filled in.
    pub fn mapping_group(&self) -> &Group {
        &self.mapping
    }

    pub fn mapping_group_mut(&mut self) -> &mut Group {
        &mut self.mapping
    }

    pub fn equatorial_radius(&self) -> f64 {
        self.equatorial_radius
    }

    pub fn polar_radius(&self) -> f64 {
        self.polar_radius
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn latitude_type(&self) -> LatitudeType {
        self.latitude_type
    }

    pub fn longitude_direction(&self) -> LongitudeDirection {
        self.longitude_direction
    }

    pub fn longitude_domain(&self) -> LongitudeDomain {
        self.longitude_domain
    }

    pub fn ground_range(&self) -> Option<LatLonRange> {
        self.ground_range
    }

    /// Rotation of the projection plane, degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_planetographic(&self) -> bool {
        self.latitude_type == LatitudeType::Planetographic
    }

    pub fn is_positive_west(&self) -> bool {
        self.longitude_direction == LongitudeDirection::PositiveWest
    }

    /// Radius at a latitude of the mapping's type.
    pub fn local_radius(&self, lat: f64) -> f64 {
        let lat = if self.is_planetographic() {
            to_planetocentric(lat, self.equatorial_radius, self.polar_radius).unwrap_or(lat)
        } else {
            lat
        };
        local_radius(lat, self.equatorial_radius, self.polar_radius)
    }

    /// Longitude in the mapping direction to positive east (no wrap).
    pub fn to_east(&self, lon: f64) -> f64 {
        if self.is_positive_west() { -lon } else { lon }
    }

    /// Positive-east longitude back to the mapping direction (no wrap).
    pub fn from_east(&self, lon: f64) -> f64 {
        self.to_east(lon)
    }

    /// Universal ground to the mapping's conventions. `bound` wraps the
    /// longitude into the mapping's domain.
    pub fn from_universal(&self, lat: f64, lon: f64, bound: bool) -> Option<(f64, f64)> {
        let lat = if self.is_planetographic() {
            to_planetographic(lat, self.equatorial_radius, self.polar_radius).ok()?
        } else {
            lat
        };
        let lon = match (bound, self.is_positive_west()) {
            (true, true) => to_positive_west(lon, self.longitude_domain),
            (true, false) => self.longitude_domain.wrap(lon),
            (false, _) => self.from_east(lon),
        };
        Some((lat, lon))
    }

    fn rotate(&self, x: f64, y: f64) -> (f64, f64) {
        if self.rotation == 0.0 {
            return (x, y);
        }
        let (sin_r, cos_r) = self.rotation.to_radians().sin_cos();
        (x * cos_r + y * sin_r, y * cos_r - x * sin_r)
    }

    fn unrotate(&self, x: f64, y: f64) -> (f64, f64) {
        if self.rotation == 0.0 {
            return (x, y);
        }
        let (sin_r, cos_r) = self.rotation.to_radians().sin_cos();
        (x * cos_r - y * sin_r, y * cos_r + x * sin_r)
    }

    fn store(&mut self, ground: Option<(f64, f64)>, xy: Option<(f64, f64)>) -> bool {
        match (ground, xy) {
            (Some((lat, lon)), Some((x, y))) => {
                self.latitude = lat;
                self.longitude = lon;
                self.x = x;
                self.y = y;
                self.good = true;
            }
            _ => self.good = false,
        }
        self.good
    }
}

fn read_ground_range(mapping: &Group) -> Result<Option<LatLonRange>> {
    let names = [
        "MinimumLatitude",
        "MaximumLatitude",
        "MinimumLongitude",
        "MaximumLongitude",
    ];
    if !names.iter().all(|n| mapping.has_keyword(n)) {
        return Ok(None);
    }
    let range = LatLonRange {
        min_lat: mapping.f64("MinimumLatitude")?,
        max_lat: mapping.f64("MaximumLatitude")?,
        min_lon: mapping.f64("MinimumLongitude")?,
        max_lon: mapping.f64("MaximumLongitude")?,
    };
    for (name, value) in [
        ("MinimumLatitude", range.min_lat),
        ("MaximumLatitude", range.max_lat),
    ] {
        if !(-90.0..=90.0).contains(&value) {
            return Err(Error::invalid_keyword(
                name,
                value,
                "must be between -90 and 90",
            ));
        }
    }
    if range.min_lat > range.max_lat {
        return Err(Error::User(format!(
            "[MinimumLatitude,MaximumLatitude] of [{},{}] are not properly ordered",
            range.min_lat, range.max_lat
        )));
    }
    if range.min_lon > range.max_lon {
        return Err(Error::User(format!(
            "[MinimumLongitude,MaximumLongitude] of [{},{}] are not properly ordered",
            range.min_lon, range.max_lon
        )));
    }
    Ok(Some(range))
}

// ============================================================================
// Trait
// ============================================================================

/// A latitude/longitude map projection.
///
/// Implementors provide the pure formulas; everything else is provided.
/// `project` receives latitudes in the mapping's latitude type (or
/// planetographic when [`TProjection::uses_planetographic`] is true) and
/// longitudes positive east without wrapping. `unproject` returns the same
/// conventions. Both work on unrotated coordinates.
pub trait TProjection {
    fn state(&self) -> &ProjectionState;
    fn state_mut(&mut self) -> &mut ProjectionState;

    /// Registered name, as written in `ProjectionName`.
    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str {
        "1.0"
    }

    /// Forward formula: ground to unrotated projection coordinates.
    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)>;

    /// Inverse formula: unrotated projection coordinates to ground.
    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Parallels and meridians map to straight perpendicular lines, so
    /// 360 degrees of longitude span a fixed width at the equator.
    fn is_equatorial_cylindrical(&self) -> bool {
        false
    }

    /// Latitude at which the scale is true, degrees.
    fn true_scale_latitude(&self) -> f64 {
        0.0
    }

    /// The formulas need planetographic latitudes.
    fn uses_planetographic(&self) -> bool {
        false
    }

    /// Inverse longitudes are wrapped into the mapping's domain.
    fn wraps_longitude(&self) -> bool {
        false
    }

    /// Projection-specific keywords reported by [`TProjection::mapping`].
    fn projection_keywords(&self) -> &'static [&'static str] {
        &[]
    }

    /// Ground points, beyond the range border, that can extend the XY range
    /// (for example the equator or the central meridian).
    fn xy_range_extras(&self, _range: &LatLonRange) -> Vec<(f64, f64)> {
        Vec::new()
    }

    // ------------------------------------------------------------------------
    // Provided: pure conversions
    // ------------------------------------------------------------------------

    /// Ground in mapping conventions to rotated projection coordinates.
    fn ground_to_xy(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        if is_special(lat) || is_special(lon) || !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let st = self.state();
        let lat = if self.uses_planetographic() && !st.is_planetographic() {
            to_planetographic(lat, st.equatorial_radius, st.polar_radius).ok()?
        } else {
            lat
        };
        let (x, y) = self.project(lat, st.to_east(lon))?;
        Some(st.rotate(x, y))
    }

    /// Rotated projection coordinates to ground in mapping conventions.
    fn xy_to_ground(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if is_special(x) || is_special(y) || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let st = self.state();
        let (ux, uy) = st.unrotate(x, y);
        let (lat, lon) = self.unproject(ux, uy)?;
        let lat = if self.uses_planetographic() && !st.is_planetographic() {
            to_planetocentric(lat, st.equatorial_radius, st.polar_radius).ok()?
        } else {
            lat
        };
        let mut lon = st.from_east(lon);
        if self.wraps_longitude() {
            lon = st.longitude_domain.wrap(lon);
        }
        Some((lat, lon))
    }

    // ------------------------------------------------------------------------
    // Provided: stateful protocol
    // ------------------------------------------------------------------------

    /// Set the current position from a ground point in mapping conventions.
    fn set_ground(&mut self, lat: f64, lon: f64) -> bool {
        let xy = self.ground_to_xy(lat, lon);
        self.state_mut().store(Some((lat, lon)), xy)
    }

    /// Set the current position from projection coordinates.
    fn set_coordinate(&mut self, x: f64, y: f64) -> bool {
        let ground = self.xy_to_ground(x, y);
        self.state_mut().store(ground, Some((x, y)))
    }

    /// Set the current position from a universal ground point.
    fn set_universal_ground(&mut self, lat: f64, lon: f64) -> bool {
        match self.state().from_universal(lat, lon, true) {
            Some((lat, lon)) => self.set_ground(lat, lon),
            None => self.state_mut().store(None, None),
        }
    }

    /// Like [`TProjection::set_universal_ground`] but keeps the longitude
    /// outside the mapping's domain when given that way.
    fn set_unbound_universal_ground(&mut self, lat: f64, lon: f64) -> bool {
        match self.state().from_universal(lat, lon, false) {
            Some((lat, lon)) => self.set_ground(lat, lon),
            None => self.state_mut().store(None, None),
        }
    }

    /// Set the current position from world (pixel) coordinates.
    fn set_world(&mut self, world_x: f64, world_y: f64) -> bool {
        let x = self.to_projection_x(world_x);
        let y = self.to_projection_y(world_y);
        self.set_coordinate(x, y)
    }

    fn is_good(&self) -> bool {
        self.state().good
    }

    fn x_coord(&self) -> f64 {
        self.state().x
    }

    fn y_coord(&self) -> f64 {
        self.state().y
    }

    /// Current latitude in the mapping's latitude type.
    fn latitude(&self) -> f64 {
        self.state().latitude
    }

    /// Current longitude in the mapping's direction and domain.
    fn longitude(&self) -> f64 {
        self.state().longitude
    }

    /// Current latitude, planetocentric.
    fn universal_latitude(&self) -> f64 {
        let st = self.state();
        if st.is_planetographic() {
            to_planetocentric(st.latitude, st.equatorial_radius, st.polar_radius)
                .unwrap_or(st.latitude)
        } else {
            st.latitude
        }
    }

    /// Current longitude, positive east in `[0, 360)`.
    fn universal_longitude(&self) -> f64 {
        let st = self.state();
        let lon = st.to_east(st.longitude).rem_euclid(360.0);
        if lon >= 360.0 { 0.0 } else { lon }
    }

    fn world_x(&self) -> f64 {
        self.to_world_x(self.state().x)
    }

    fn world_y(&self) -> f64 {
        self.to_world_y(self.state().y)
    }

    fn to_world_x(&self, x: f64) -> f64 {
        match &self.state().mapper {
            Some(m) => m.world_x(x),
            None => x,
        }
    }

    fn to_world_y(&self, y: f64) -> f64 {
        match &self.state().mapper {
            Some(m) => m.world_y(y),
            None => y,
        }
    }

    fn to_projection_x(&self, world_x: f64) -> f64 {
        match &self.state().mapper {
            Some(m) => m.projection_x(world_x),
            None => world_x,
        }
    }

    fn to_projection_y(&self, world_y: f64) -> f64 {
        match &self.state().mapper {
            Some(m) => m.projection_y(world_y),
            None => world_y,
        }
    }

    fn set_world_mapper(&mut self, mapper: WorldMapper) {
        self.state_mut().mapper = Some(mapper);
    }

    fn world_mapper(&self) -> Option<&WorldMapper> {
        self.state().mapper.as_ref()
    }

    /// Pixel resolution in metres, 1 without a world mapper.
    fn resolution(&self) -> f64 {
        self.state().mapper.map_or(1.0, |m| m.resolution())
    }

    /// Pixels per degree at the true-scale latitude.
    fn scale(&self) -> f64 {
        let radius = self.state().local_radius(self.true_scale_latitude());
        2.0 * PI * radius / (360.0 * self.resolution())
    }

    // ------------------------------------------------------------------------
    // Provided: ground range
    // ------------------------------------------------------------------------

    fn has_ground_range(&self) -> bool {
        self.state().ground_range.is_some()
    }

    /// True when `lon` is inside the ground range (always true without one).
    fn in_longitude_range(&self, lon: f64) -> bool {
        match self.state().ground_range {
            Some(r) => in_longitude_range(r.min_lon, r.max_lon, lon),
            None => true,
        }
    }

    /// True when `lat` is inside the ground range (always true without one).
    fn in_latitude_range(&self, lat: f64) -> bool {
        match self.state().ground_range {
            Some(r) => in_latitude_range(r.min_lat, r.max_lat, lat),
            None => true,
        }
    }

    /// Projection coordinate extent of the ground range.
    ///
    /// Walks the border of the range in 0.01 degree steps and adds the
    /// projection's extra points. `None` without a ground range or when no
    /// point projects.
    fn xy_range(&self) -> Option<XYRange> {
        let range = self.state().ground_range?;
        let mut xy = XYRange::empty();
        let mut include = |lat: f64, lon: f64| {
            if let Some((x, y)) = self.ground_to_xy(lat, lon) {
                xy.include(x, y);
            }
        };
        for lat in steps(range.min_lat, range.max_lat) {
            include(lat, range.min_lon);
            include(lat, range.max_lon);
        }
        for lon in steps(range.min_lon, range.max_lon) {
            include(range.min_lat, lon);
            include(range.max_lat, lon);
        }
        for (lat, lon) in self.xy_range_extras(&range) {
            include(lat, lon);
        }
        xy.is_valid().then_some(xy)
    }

    // ------------------------------------------------------------------------
    // Provided: label
    // ------------------------------------------------------------------------

    /// Canonical mapping group for this projection.
    fn mapping(&self) -> Group {
        let source = &self.state().mapping;
        let mut out = Group::new("Mapping");
        for name in CANONICAL_KEYWORDS
            .iter()
            .chain(self.projection_keywords().iter())
        {
            if *name == "ProjectionName" {
                out.set(Keyword::new("ProjectionName", self.name()));
            } else if let Some(k) = source.find_keyword(name) {
                out.set(k.clone());
            }
        }
        out
    }
}

/// Inclusive walk from `min` to `max` in [`XY_RANGE_STEP`] increments.
fn steps(min: f64, max: f64) -> impl Iterator<Item = f64> {
    let n = ((max - min) / XY_RANGE_STEP).ceil().max(0.0) as usize;
    (0..=n).map(move |i| (min + i as f64 * XY_RANGE_STEP).min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> Group {
        let mut g = Group::new("Mapping");
        g.set(Keyword::new("EquatorialRadius", 3396190.0));
        g.set(Keyword::new("PolarRadius", 3376200.0));
        g
    }

    #[test]
    fn test_defaults_written_back() {
        let state = ProjectionState::from_mapping(mapping(), true).unwrap();
        assert_eq!(state.latitude_type(), LatitudeType::Planetocentric);
        assert_eq!(state.longitude_domain(), LongitudeDomain::Domain360);
        assert_eq!(
            state.mapping_group().text("LongitudeDirection").unwrap(),
            "PositiveEast"
        );
        assert!(state.ground_range().is_none());
    }

    #[test]
    fn test_missing_conventions_without_defaults() {
        let err = ProjectionState::from_mapping(mapping(), false).unwrap_err();
        assert!(err.to_string().contains("Invalid label group [Mapping]"));
        assert!(err.to_string().contains("LatitudeType"));
    }

    #[test]
    fn test_radius_validation() {
        let mut g = mapping();
        g.set(Keyword::new("PolarRadius", 4000000.0));
        assert!(ProjectionState::from_mapping(g, true).is_err());
        let mut g = mapping();
        g.set(Keyword::new("EquatorialRadius", 0.0));
        assert!(ProjectionState::from_mapping(g, true).is_err());
    }

    #[test]
    fn test_ground_range_validation() {
        let mut g = mapping();
        g.set(Keyword::new("MinimumLatitude", 10.0));
        g.set(Keyword::new("MaximumLatitude", -10.0));
        g.set(Keyword::new("MinimumLongitude", 0.0));
        g.set(Keyword::new("MaximumLongitude", 10.0));
        let err = ProjectionState::from_mapping(g.clone(), true).unwrap_err();
        assert!(err.to_string().contains("not properly ordered"));

        g.set(Keyword::new("MinimumLatitude", -95.0));
        assert!(ProjectionState::from_mapping(g, true).is_err());
    }

    #[test]
    fn test_rotation_inverse() {
        let mut g = mapping();
        g.set(Keyword::new("Rotation", 30.0));
        let state = ProjectionState::from_mapping(g, true).unwrap();
        let (x, y) = state.rotate(3.0, -4.0);
        let (bx, by) = state.unrotate(x, y);
        assert!((bx - 3.0).abs() < 1e-12 && (by + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_steps_inclusive() {
        let v: Vec<f64> = steps(0.0, 0.025).collect();
        assert_eq!(v.len(), 4);
        assert_eq!(*v.last().unwrap(), 0.025);
        assert_eq!(steps(5.0, 5.0).count(), 1);
    }
}
