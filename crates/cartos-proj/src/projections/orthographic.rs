//! Orthographic (the view from infinitely far away) on a sphere of the
//! equatorial radius
//!
//! Only the hemisphere facing the viewer projects; points behind the limb
//! fail.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{LatLonRange, ProjectionState, TProjection, f64_or_default};
use cartos_core::Label;
use cartos_core::conventions::{
    in_latitude_range, in_longitude_range, to_planetocentric, to_planetographic,
};
use std::f64::consts::FRAC_PI_2;

const LIMB_TOLERANCE: f64 = 1.0e-10;

#[derive(Debug, Clone)]
pub struct Orthographic {
    state: ProjectionState,
    /// Planetographic, radians
    center_latitude: f64,
    center_longitude: f64,
    sin_phi0: f64,
    cos_phi0: f64,
}

impl Orthographic {
    pub fn new(label: &Label, allow_defaults: bool) -> ProjectionResult<Self> {
        let mut state = ProjectionState::from_label(label, allow_defaults)?;
        let range = state.ground_range();
        let mapping = state.mapping_group_mut();
        let center_lat = f64_or_default(
            mapping,
            "CenterLatitude",
            Some(range.map_or(0.0, |r| r.mid_latitude())),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        let center_lon = f64_or_default(
            mapping,
            "CenterLongitude",
            Some(range.map_or(0.0, |r| r.mid_longitude())),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        if let Some(r) = range {
            if r.max_lon - r.min_lon > 360.0 {
                return Err(ProjectionError::mapping(format!(
                    "[MinimumLongitude,MaximumLongitude] of [{},{}] span more than 360 degrees",
                    r.min_lon, r.max_lon
                )));
            }
        }

        let graphic = if state.is_planetographic() {
            center_lat
        } else {
            to_planetographic(center_lat, state.equatorial_radius(), state.polar_radius())
                .map_err(ProjectionError::mapping)?
        };
        let phi0 = graphic.to_radians();
        Ok(Self {
            center_longitude: state.to_east(center_lon).to_radians(),
            state,
            center_latitude: phi0,
            sin_phi0: phi0.sin(),
            cos_phi0: phi0.cos(),
        })
    }

    fn is_polar(&self) -> bool {
        (self.center_latitude.abs() - FRAC_PI_2).abs() < f64::EPSILON
    }
}

impl TProjection for Orthographic {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "Orthographic"
    }

    fn true_scale_latitude(&self) -> f64 {
        self.center_latitude.to_degrees()
    }

    fn uses_planetographic(&self) -> bool {
        true
    }

    fn wraps_longitude(&self) -> bool {
        true
    }

    fn projection_keywords(&self) -> &'static [&'static str] {
        &["CenterLatitude", "CenterLongitude"]
    }

    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let a = self.state.equatorial_radius();
        let (sin_phi, cos_phi) = lat.to_radians().sin_cos();
        let delta = lon.to_radians() - self.center_longitude;
        let (sin_d, cos_d) = delta.sin_cos();
        let g = self.sin_phi0 * sin_phi + self.cos_phi0 * cos_phi * cos_d;
        if g < -LIMB_TOLERANCE {
            return None;
        }
        Some((
            a * cos_phi * sin_d,
            a * (self.cos_phi0 * sin_phi - self.sin_phi0 * cos_phi * cos_d),
        ))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let a = self.state.equatorial_radius();
        let rho = x.hypot(y);
        if rho > a * (1.0 + LIMB_TOLERANCE) {
            return None;
        }
        if rho < f64::EPSILON {
            return Some((
                self.center_latitude.to_degrees(),
                self.center_longitude.to_degrees(),
            ));
        }
        let z = (rho / a).min(1.0).asin();
        let (sin_z, cos_z) = z.sin_cos();
        let phi = (cos_z * self.sin_phi0 + y * sin_z * self.cos_phi0 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lambda = if self.is_polar() {
            if self.center_latitude > 0.0 {
                self.center_longitude + x.atan2(-y)
            } else {
                self.center_longitude + x.atan2(y)
            }
        } else {
            let num = x * sin_z * self.cos_phi0;
            let den = (cos_z - self.sin_phi0 * phi.sin()) * rho;
            self.center_longitude + num.atan2(den)
        };
        Some((phi.to_degrees(), lambda.to_degrees()))
    }

    /// Points on the limb circle that fall inside the ground range.
    fn xy_range_extras(&self, range: &LatLonRange) -> Vec<(f64, f64)> {
        let a = self.state.equatorial_radius();
        let st = &self.state;
        (0..3600)
            .filter_map(|i| {
                let angle = (i as f64 * 0.1).to_radians();
                let (lat, lon) = self.unproject(a * angle.cos(), a * angle.sin())?;
                let lat = if st.is_planetographic() {
                    lat
                } else {
                    to_planetocentric(lat, st.equatorial_radius(), st.polar_radius()).ok()?
                };
                let lon = st.longitude_domain().wrap(st.from_east(lon));
                (in_latitude_range(range.min_lat, range.max_lat, lat)
                    && in_longitude_range(range.min_lon, range.max_lon, lon))
                .then_some((lat, lon))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::{Group, Keyword};

    fn label(center_lat: f64, center_lon: f64) -> Label {
        let mut g = Group::new("Mapping");
        g.set(Keyword::new("EquatorialRadius", 1000.0));
        g.set(Keyword::new("PolarRadius", 1000.0));
        g.set(Keyword::new("CenterLatitude", center_lat));
        g.set(Keyword::new("CenterLongitude", center_lon));
        Label::from(g)
    }

    #[test]
    fn test_far_side_fails() {
        let mut p = Orthographic::new(&label(0.0, 0.0), true).unwrap();
        assert!(p.set_ground(0.0, 45.0));
        assert!(!p.set_ground(0.0, 180.0));
        assert!(!p.set_coordinate(1001.0, 0.0));
    }

    #[test]
    fn test_oblique_round_trip() {
        let mut p = Orthographic::new(&label(40.0, 100.0), true).unwrap();
        assert!(p.set_ground(20.0, 130.0));
        let (x, y) = (p.x_coord(), p.y_coord());
        assert!(p.set_coordinate(x, y));
        assert!((p.latitude() - 20.0).abs() < 1e-9);
        assert!((p.longitude() - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_polar_round_trip() {
        let mut p = Orthographic::new(&label(-90.0, 0.0), true).unwrap();
        assert!(p.set_ground(-30.0, 300.0));
        let (x, y) = (p.x_coord(), p.y_coord());
        assert!(p.set_coordinate(x, y));
        assert!((p.latitude() + 30.0).abs() < 1e-9);
        assert!((p.longitude() - 300.0).abs() < 1e-9);
    }
}
