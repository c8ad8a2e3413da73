//! Ring-plane projections
//!
//! The ground position of a ring plane is a radius from the body centre
//! and a ring longitude. Mapping keywords mirror the planetary ones:
//!
//! | Keyword | Values |
//! |---|---|
//! | `RingLongitudeDirection` | `Clockwise`, `CounterClockwise` |
//! | `RingLongitudeDomain` | `180`, `360` |
//! | `MinimumRingRadius`, `MaximumRingRadius` | metres |
//! | `MinimumRingLongitude`, `MaximumRingLongitude` | degrees |
//!
//! Universal ring longitudes are counterclockwise, 0 to 360.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{XYRange, text_or_default};
use crate::world::WorldMapper;
use cartos_core::conventions::in_longitude_range;
use cartos_core::pixel::is_special;
use cartos_core::{Error, Group, Keyword, Label, LongitudeDomain, Result, Value};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

const RING_KEYWORDS: [&str; 12] = [
    "TargetName",
    "ProjectionName",
    "RingLongitudeDirection",
    "RingLongitudeDomain",
    "PixelResolution",
    "Scale",
    "UpperLeftCornerX",
    "UpperLeftCornerY",
    "MinimumRingRadius",
    "MaximumRingRadius",
    "MinimumRingLongitude",
    "MaximumRingLongitude",
];

/// Which way ring longitudes increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingDirection {
    Clockwise,
    #[default]
    CounterClockwise,
}

impl fmt::Display for RingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingDirection::Clockwise => f.write_str("Clockwise"),
            RingDirection::CounterClockwise => f.write_str("CounterClockwise"),
        }
    }
}

impl FromStr for RingDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("Clockwise") => Ok(RingDirection::Clockwise),
            v if v.eq_ignore_ascii_case("CounterClockwise") => Ok(RingDirection::CounterClockwise),
            _ => Err(Error::invalid_keyword(
                "RingLongitudeDirection",
                s,
                "must be [Clockwise or CounterClockwise]",
            )),
        }
    }
}

/// Ring ground range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingRange {
    pub min_radius: f64,
    pub max_radius: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

/// State shared by ring-plane projections.
#[derive(Debug, Clone)]
pub struct RingState {
    mapping: Group,
    direction: RingDirection,
    domain: LongitudeDomain,
    range: Option<RingRange>,
    mapper: Option<WorldMapper>,
    good: bool,
    x: f64,
    y: f64,
    radius: f64,
    longitude: f64,
}

impl RingState {
    /// Parse the `Mapping` group of a label.
    ///
    /// # Errors
    ///
    /// Any failure is reported as [`ProjectionError::InvalidMapping`].
    pub fn from_label(label: &Label, allow_defaults: bool) -> ProjectionResult<Self> {
        let mut mapping = label.mapping().map_err(ProjectionError::mapping)?;
        let (direction, domain, range) =
            Self::parse(&mut mapping, allow_defaults).map_err(ProjectionError::mapping)?;
        Ok(Self {
            mapping,
            direction,
            domain,
            range,
            mapper: None,
            good: false,
            x: 0.0,
            y: 0.0,
            radius: 0.0,
            longitude: 0.0,
        })
    }

    fn parse(
        mapping: &mut Group,
        allow_defaults: bool,
    ) -> Result<(RingDirection, LongitudeDomain, Option<RingRange>)> {
        let direction: RingDirection = text_or_default(
            mapping,
            "RingLongitudeDirection",
            Value::from("CounterClockwise"),
            allow_defaults,
        )?
        .parse()?;
        let domain: LongitudeDomain = text_or_default(
            mapping,
            "RingLongitudeDomain",
            Value::from(360),
            allow_defaults,
        )?
        .parse()?;

        let names = [
            "MinimumRingRadius",
            "MaximumRingRadius",
            "MinimumRingLongitude",
            "MaximumRingLongitude",
        ];
        if !names.iter().all(|n| mapping.has_keyword(n)) {
            return Ok((direction, domain, None));
        }
        let range = RingRange {
            min_radius: mapping.f64("MinimumRingRadius")?,
            max_radius: mapping.f64("MaximumRingRadius")?,
            min_longitude: mapping.f64("MinimumRingLongitude")?,
            max_longitude: mapping.f64("MaximumRingLongitude")?,
        };
        if range.min_radius < 0.0 {
            return Err(Error::invalid_keyword(
                "MinimumRingRadius",
                range.min_radius,
                "must not be negative",
            ));
        }
        if range.min_radius > range.max_radius {
            return Err(Error::User(format!(
                "[MinimumRingRadius,MaximumRingRadius] of [{},{}] are not properly ordered",
                range.min_radius, range.max_radius
            )));
        }
        if range.min_longitude > range.max_longitude {
            return Err(Error::User(format!(
                "[MinimumRingLongitude,MaximumRingLongitude] of [{},{}] are not properly ordered",
                range.min_longitude, range.max_longitude
            )));
        }
        Ok((direction, domain, Some(range)))
    }

    pub fn mapping_group(&self) -> &Group {
        &self.mapping
    }

    pub fn mapping_group_mut(&mut self) -> &mut Group {
        &mut self.mapping
    }

    pub fn direction(&self) -> RingDirection {
        self.direction
    }

    pub fn domain(&self) -> LongitudeDomain {
        self.domain
    }

    pub fn range(&self) -> Option<RingRange> {
        self.range
    }

    /// Ring longitude in the mapping's direction to counterclockwise.
    pub fn to_counterclockwise(&self, lon: f64) -> f64 {
        match self.direction {
            RingDirection::Clockwise => -lon,
            RingDirection::CounterClockwise => lon,
        }
    }

    fn store(&mut self, ground: Option<(f64, f64)>, xy: Option<(f64, f64)>) -> bool {
        match (ground, xy) {
            (Some((radius, lon)), Some((x, y))) => {
                self.radius = radius;
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

/// Read a numeric ring keyword or fall back to `default` when allowed.
pub(crate) fn ring_f64_or_default(
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
            mapping.set(Keyword::new(name, value));
            Ok(value)
        }
        _ => Err(Error::missing_keyword("Mapping", name)),
    }
}

/// A ring-plane map projection.
///
/// `project` receives a radius and a counterclockwise ring longitude in
/// degrees; `unproject` returns the same.
pub trait RingProjection {
    fn state(&self) -> &RingState;
    fn state_mut(&mut self) -> &mut RingState;
    fn name(&self) -> &'static str;

    fn project(&self, radius: f64, lon: f64) -> Option<(f64, f64)>;
    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    fn is_equatorial_cylindrical(&self) -> bool {
        false
    }

    /// Radius at which the scale is true, metres.
    fn true_scale_ring_radius(&self) -> f64;

    fn projection_keywords(&self) -> &'static [&'static str] {
        &[]
    }

    fn set_ground(&mut self, radius: f64, lon: f64) -> bool {
        let xy = if is_special(radius) || is_special(lon) || radius < 0.0 {
            None
        } else {
            let ccw = self.state().to_counterclockwise(lon);
            self.project(radius, ccw)
        };
        self.state_mut().store(Some((radius, lon)), xy)
    }

    fn set_coordinate(&mut self, x: f64, y: f64) -> bool {
        let ground = if is_special(x) || is_special(y) {
            None
        } else {
            self.unproject(x, y).map(|(radius, ccw)| {
                let st = self.state();
                (radius, st.domain.wrap(st.to_counterclockwise(ccw)))
            })
        };
        self.state_mut().store(ground, Some((x, y)))
    }

    /// Set from a universal (counterclockwise, 0 to 360) ring longitude.
    fn set_universal_ground(&mut self, radius: f64, lon: f64) -> bool {
        let st = self.state();
        let lon = st.domain.wrap(st.to_counterclockwise(lon));
        self.set_ground(radius, lon)
    }

    fn set_world(&mut self, world_x: f64, world_y: f64) -> bool {
        let (x, y) = match &self.state().mapper {
            Some(m) => (m.projection_x(world_x), m.projection_y(world_y)),
            None => (world_x, world_y),
        };
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

    fn ring_radius(&self) -> f64 {
        self.state().radius
    }

    fn ring_longitude(&self) -> f64 {
        self.state().longitude
    }

    fn universal_ring_radius(&self) -> f64 {
        self.state().radius
    }

    fn universal_ring_longitude(&self) -> f64 {
        let st = self.state();
        let lon = st.to_counterclockwise(st.longitude).rem_euclid(360.0);
        if lon >= 360.0 { 0.0 } else { lon }
    }

    fn world_x(&self) -> f64 {
        let st = self.state();
        st.mapper.map_or(st.x, |m| m.world_x(st.x))
    }

    fn world_y(&self) -> f64 {
        let st = self.state();
        st.mapper.map_or(st.y, |m| m.world_y(st.y))
    }

    fn set_world_mapper(&mut self, mapper: WorldMapper) {
        self.state_mut().mapper = Some(mapper);
    }

    fn world_mapper(&self) -> Option<&WorldMapper> {
        self.state().mapper.as_ref()
    }

    fn resolution(&self) -> f64 {
        self.state().mapper.map_or(1.0, |m| m.resolution())
    }

    /// Pixels per degree at the true-scale radius.
    fn scale(&self) -> f64 {
        2.0 * PI * self.true_scale_ring_radius() / (360.0 * self.resolution())
    }

    fn has_ground_range(&self) -> bool {
        self.state().range.is_some()
    }

    fn in_ring_longitude_range(&self, lon: f64) -> bool {
        match self.state().range {
            Some(r) => in_longitude_range(r.min_longitude, r.max_longitude, lon),
            None => true,
        }
    }

    fn in_ring_radius_range(&self, radius: f64) -> bool {
        match self.state().range {
            Some(r) => r.min_radius <= radius && radius <= r.max_radius,
            None => true,
        }
    }

    /// Projection extent of the ring range, walking its border.
    fn xy_range(&self) -> Option<XYRange> {
        let range = self.state().range?;
        let mut xy = XYRange::empty();
        let st = self.state();
        let mut include = |radius: f64, lon: f64| {
            if let Some((x, y)) = self.project(radius, st.to_counterclockwise(lon)) {
                xy.include(x, y);
            }
        };
        let lon_steps = ((range.max_longitude - range.min_longitude) / 0.01).ceil() as usize;
        for i in 0..=lon_steps {
            let lon = (range.min_longitude + i as f64 * 0.01).min(range.max_longitude);
            include(range.min_radius, lon);
            include(range.max_radius, lon);
        }
        let radius_step = (range.max_radius - range.min_radius) / 1000.0;
        for i in 0..=1000 {
            let radius = range.min_radius + i as f64 * radius_step;
            include(radius, range.min_longitude);
            include(radius, range.max_longitude);
        }
        xy.is_valid().then_some(xy)
    }

    fn mapping(&self) -> Group {
        let source = &self.state().mapping;
        let mut out = Group::new("Mapping");
        for name in RING_KEYWORDS.iter().chain(self.projection_keywords().iter()) {
            if *name == "ProjectionName" {
                out.set(Keyword::new("ProjectionName", self.name()));
            } else if let Some(k) = source.find_keyword(name) {
                out.set(k.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!(
            "clockwise".parse::<RingDirection>().unwrap(),
            RingDirection::Clockwise
        );
        assert!("Sideways".parse::<RingDirection>().is_err());
        assert_eq!(RingDirection::CounterClockwise.to_string(), "CounterClockwise");
    }

    #[test]
    fn test_range_ordering() {
        let mut g = Group::new("Mapping");
        g.set(Keyword::new("MinimumRingRadius", 2.0));
        g.set(Keyword::new("MaximumRingRadius", 1.0));
        g.set(Keyword::new("MinimumRingLongitude", 0.0));
        g.set(Keyword::new("MaximumRingLongitude", 10.0));
        assert!(RingState::from_label(&Label::from(g), true).is_err());
    }
}
