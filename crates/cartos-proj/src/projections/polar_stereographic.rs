//! Polar stereographic on the ellipsoid
//!
//! The aspect follows the sign of `CenterLatitude`: north for positive,
//! south for negative. When the centre latitude is not at a pole the scale
//! is true along that parallel.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{ProjectionState, TProjection, f64_or_default};
use crate::snyder::{e4_compute, m_compute, phi2_compute, t_compute};
use cartos_core::Label;
use cartos_core::conventions::to_planetographic;
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct PolarStereographic {
    state: ProjectionState,
    center_latitude: f64,
    center_longitude: f64,
    sign: f64,
    e4: f64,
    /// `m` and `t` at the true-scale parallel; `None` at a pole
    true_scale: Option<(f64, f64)>,
}

impl PolarStereographic {
    pub fn new(label: &Label, allow_defaults: bool) -> ProjectionResult<Self> {
        let mut state = ProjectionState::from_label(label, allow_defaults)?;
        let range = state.ground_range();
        let mapping = state.mapping_group_mut();
        let default_lat = match range {
            Some(r) if r.mid_latitude() < 0.0 => -90.0,
            _ => 90.0,
        };
        let center_lat = f64_or_default(mapping, "CenterLatitude", Some(default_lat), allow_defaults)
            .map_err(ProjectionError::mapping)?;
        let center_lon = f64_or_default(
            mapping,
            "CenterLongitude",
            Some(range.map_or(0.0, |r| r.mid_longitude())),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        if center_lat == 0.0 || center_lat.abs() > 90.0 {
            return Err(ProjectionError::mapping(format!(
                "[CenterLatitude] of [{center_lat}] must be non-zero and within -90 to 90"
            )));
        }

        let graphic = if state.is_planetographic() {
            center_lat
        } else {
            to_planetographic(center_lat, state.equatorial_radius(), state.polar_radius())
                .map_err(ProjectionError::mapping)?
        };
        let sign = center_lat.signum();
        let e = state.eccentricity();
        let phi_c = sign * graphic.to_radians();
        let true_scale = if (phi_c - FRAC_PI_2).abs() > f64::EPSILON {
            let sin_c = phi_c.sin();
            Some((
                m_compute(sin_c, phi_c.cos(), e),
                t_compute(phi_c, sin_c, e),
            ))
        } else {
            None
        };
        Ok(Self {
            center_longitude: state.to_east(center_lon).to_radians(),
            state,
            center_latitude: center_lat,
            sign,
            e4: e4_compute(e),
            true_scale,
        })
    }

    fn distance_factor(&self) -> f64 {
        let a = self.state.equatorial_radius();
        match self.true_scale {
            Some((mcs, tcs)) => a * mcs / tcs,
            None => 2.0 * a / self.e4,
        }
    }
}

impl TProjection for PolarStereographic {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "PolarStereographic"
    }

    fn true_scale_latitude(&self) -> f64 {
        self.center_latitude
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
        let phi = self.sign * lat.to_radians();
        // The opposite pole maps to infinity
        if phi <= -FRAC_PI_2 + 1.0e-10 {
            return None;
        }
        let lambda = self.sign * (lon.to_radians() - self.center_longitude);
        let ts = t_compute(phi, phi.sin(), self.state.eccentricity());
        let dist = self.distance_factor() * ts;
        Some((
            self.sign * dist * lambda.sin(),
            -self.sign * dist * lambda.cos(),
        ))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (xs, ys) = (self.sign * x, self.sign * y);
        let rh = xs.hypot(ys);
        let ts = rh / self.distance_factor();
        let phi = self.sign * phi2_compute(self.state.eccentricity(), ts).ok()?;
        let lambda = if rh == 0.0 {
            self.center_longitude
        } else {
            self.sign * xs.atan2(-ys) + self.center_longitude
        };
        Some((phi.to_degrees(), lambda.to_degrees()))
    }
}
