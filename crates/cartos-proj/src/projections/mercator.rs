//! Mercator (conformal cylindrical) on the ellipsoid
//!
//! ```text
//! k = cos(lat0) / sqrt(1 - e^2 sin^2(lat0))
//! x = a k (lon - lon0)
//! y = -a k ln(t(lat))
//! ```

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{ProjectionState, TProjection, f64_or_default};
use crate::snyder::{phi2_compute, t_compute};
use cartos_core::Label;
use cartos_core::conventions::to_planetographic;
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct Mercator {
    state: ProjectionState,
    center_latitude: f64,
    center_longitude: f64,
    scale_factor: f64,
}

impl Mercator {
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
        if center_lat.abs() >= 90.0 {
            return Err(ProjectionError::mapping(format!(
                "[CenterLatitude] of [{center_lat}] must be between -90 and 90 (exclusive)"
            )));
        }
        if let Some(r) = range {
            if r.min_lat <= -90.0 || r.max_lat >= 90.0 {
                return Err(ProjectionError::mapping(
                    "Mercator ground range cannot include a pole",
                ));
            }
        }

        let graphic = if state.is_planetographic() {
            center_lat
        } else {
            to_planetographic(center_lat, state.equatorial_radius(), state.polar_radius())
                .map_err(ProjectionError::mapping)?
        };
        let phi0 = graphic.to_radians();
        let e = state.eccentricity();
        let scale_factor = phi0.cos() / (1.0 - (e * phi0.sin()).powi(2)).sqrt();
        Ok(Self {
            center_longitude: state.to_east(center_lon).to_radians(),
            state,
            center_latitude: center_lat,
            scale_factor,
        })
    }
}

impl TProjection for Mercator {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "Mercator"
    }

    fn is_equatorial_cylindrical(&self) -> bool {
        true
    }

    fn true_scale_latitude(&self) -> f64 {
        self.center_latitude
    }

    fn uses_planetographic(&self) -> bool {
        true
    }

    fn projection_keywords(&self) -> &'static [&'static str] {
        &["CenterLatitude", "CenterLongitude"]
    }

    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let phi = lat.to_radians();
        if phi.abs() >= FRAC_PI_2 - f64::EPSILON {
            return None;
        }
        let ak = self.state.equatorial_radius() * self.scale_factor;
        let ts = t_compute(phi, phi.sin(), self.state.eccentricity());
        Some((
            ak * (lon.to_radians() - self.center_longitude),
            -ak * ts.ln(),
        ))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let ak = self.state.equatorial_radius() * self.scale_factor;
        let ts = (-y / ak).exp();
        let phi = phi2_compute(self.state.eccentricity(), ts).ok()?;
        let lambda = self.center_longitude + x / ak;
        Some((phi.to_degrees(), lambda.to_degrees()))
    }
}
