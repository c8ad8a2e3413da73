//! Sinusoidal (equal-area, pseudocylindrical)
//!
//! ```text
//! x = a (lon - lon0) cos(lat)
//! y = a lat
//! ```

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{LatLonRange, ProjectionState, TProjection, f64_or_default};
use cartos_core::Label;
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct Sinusoidal {
    state: ProjectionState,
    /// Radians, positive east
    center_longitude: f64,
}

impl Sinusoidal {
    /// Build from a label's `Mapping` group. `CenterLongitude` defaults to
    /// the middle of the ground range (0 without one).
    pub fn new(label: &Label, allow_defaults: bool) -> ProjectionResult<Self> {
        let mut state = ProjectionState::from_label(label, allow_defaults)?;
        let default = state.ground_range().map_or(0.0, |r| r.mid_longitude());
        let center = f64_or_default(
            state.mapping_group_mut(),
            "CenterLongitude",
            Some(default),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        let center_longitude = state.to_east(center).to_radians();
        Ok(Self {
            state,
            center_longitude,
        })
    }

    /// Centre longitude in the mapping's direction, degrees.
    pub fn center_longitude(&self) -> f64 {
        self.state.from_east(self.center_longitude.to_degrees())
    }
}

impl TProjection for Sinusoidal {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "Sinusoidal"
    }

    fn projection_keywords(&self) -> &'static [&'static str] {
        &["CenterLongitude"]
    }

    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let a = self.state.equatorial_radius();
        let phi = lat.to_radians();
        let delta = lon.to_radians() - self.center_longitude;
        Some((a * delta * phi.cos(), a * phi))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let a = self.state.equatorial_radius();
        let phi = y / a;
        if phi.abs() > FRAC_PI_2 + f64::EPSILON {
            return None;
        }
        let cos_phi = phi.cos();
        let lambda = if cos_phi <= f64::EPSILON {
            self.center_longitude
        } else {
            self.center_longitude + x / (a * cos_phi)
        };
        Some((phi.clamp(-FRAC_PI_2, FRAC_PI_2).to_degrees(), lambda.to_degrees()))
    }

    fn xy_range_extras(&self, range: &LatLonRange) -> Vec<(f64, f64)> {
        // Widest at the equator
        if range.min_lat < 0.0 && range.max_lat > 0.0 {
            vec![(0.0, range.min_lon), (0.0, range.max_lon)]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::{Group, Keyword};

    fn label(extra: &[(&str, f64)]) -> Label {
        let mut g = Group::new("Mapping");
        g.set(Keyword::new("ProjectionName", "Sinusoidal"));
        g.set(Keyword::new("EquatorialRadius", 1.0));
        g.set(Keyword::new("PolarRadius", 1.0));
        for (k, v) in extra {
            g.set(Keyword::new(*k, *v));
        }
        Label::from(g)
    }

    #[test]
    fn test_forward_unit_sphere() {
        let mut p = Sinusoidal::new(&label(&[("CenterLongitude", 0.0)]), true).unwrap();
        assert!(p.set_ground(60.0, 90.0));
        assert!((p.x_coord() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((p.y_coord() - 60f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_default_center_from_range() {
        let l = label(&[
            ("MinimumLatitude", -10.0),
            ("MaximumLatitude", 10.0),
            ("MinimumLongitude", 20.0),
            ("MaximumLongitude", 40.0),
        ]);
        let p = Sinusoidal::new(&l, true).unwrap();
        assert_eq!(p.center_longitude(), 30.0);
        assert!(Sinusoidal::new(&l, false).is_err());
    }

    #[test]
    fn test_inverse_beyond_pole_fails() {
        let mut p = Sinusoidal::new(&label(&[("CenterLongitude", 0.0)]), true).unwrap();
        assert!(!p.set_coordinate(0.0, 2.0));
        assert!(!p.is_good());
    }

    #[test]
    fn test_positive_west() {
        let mut l = label(&[("CenterLongitude", 0.0)]);
        l.group_mut("Mapping")
            .unwrap()
            .set(Keyword::new("LongitudeDirection", "PositiveWest"));
        let mut p = Sinusoidal::new(&l, true).unwrap();
        assert!(p.set_ground(0.0, 10.0));
        assert!(p.x_coord() < 0.0);
        assert!(p.set_universal_ground(0.0, 350.0));
        assert_eq!(p.longitude(), 10.0);
        assert!((p.universal_longitude() - 350.0).abs() < 1e-9);
    }
}
