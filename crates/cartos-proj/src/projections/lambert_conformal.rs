//! Lambert conformal conic on the ellipsoid
//!
//! Two standard parallels; a single parallel (both equal) gives the
//! tangent cone. Parallels symmetric about the equator have no cone.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{ProjectionState, TProjection, f64_or_default};
use crate::snyder::{m_compute, phi2_compute, t_compute};
use cartos_core::Label;
use cartos_core::conventions::to_planetographic;
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct LambertConformal {
    state: ProjectionState,
    center_latitude: f64,
    center_longitude: f64,
    /// Cone constant
    n: f64,
    /// `a F`
    af: f64,
    rho0: f64,
}

impl LambertConformal {
    /// Build from a label's `Mapping` group.
    ///
    /// With `allow_defaults`, the standard parallels default to one sixth of
    /// the latitude range in from each edge and the centre to the middle of
    /// the range.
    pub fn new(label: &Label, allow_defaults: bool) -> ProjectionResult<Self> {
        let mut state = ProjectionState::from_label(label, allow_defaults)?;
        let range = state.ground_range();
        let mapping = state.mapping_group_mut();
        let center_lat = f64_or_default(
            mapping,
            "CenterLatitude",
            range.map(|r| r.mid_latitude()),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        let center_lon = f64_or_default(
            mapping,
            "CenterLongitude",
            range.map(|r| r.mid_longitude()),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        let sixth = range.map(|r| (r.max_lat - r.min_lat) / 6.0);
        let par1 = f64_or_default(
            mapping,
            "FirstStandardParallel",
            range.zip(sixth).map(|(r, d)| r.min_lat + d),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        let par2 = f64_or_default(
            mapping,
            "SecondStandardParallel",
            range.zip(sixth).map(|(r, d)| r.max_lat - d),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;

        for (name, value) in [
            ("CenterLatitude", center_lat),
            ("FirstStandardParallel", par1),
            ("SecondStandardParallel", par2),
        ] {
            if value.abs() >= 90.0 {
                return Err(ProjectionError::mapping(format!(
                    "[{name}] of [{value}] must be between -90 and 90 (exclusive)"
                )));
            }
        }
        if (par1 + par2).abs() < f64::EPSILON {
            return Err(ProjectionError::mapping(format!(
                "Standard parallels [{par1},{par2}] cannot be symmetric about the equator"
            )));
        }

        let (a, c) = (state.equatorial_radius(), state.polar_radius());
        let graphic = |lat: f64| -> ProjectionResult<f64> {
            if state.is_planetographic() {
                Ok(lat.to_radians())
            } else {
                Ok(to_planetographic(lat, a, c)
                    .map_err(ProjectionError::mapping)?
                    .to_radians())
            }
        };
        let mut p1 = graphic(par1)?;
        let mut p2 = graphic(par2)?;
        if p1.abs() > p2.abs() {
            std::mem::swap(&mut p1, &mut p2);
        }
        let phi0 = graphic(center_lat)?;
        let e = state.eccentricity();

        let (sin1, cos1) = p1.sin_cos();
        let m1 = m_compute(sin1, cos1, e);
        let t1 = t_compute(p1, sin1, e);
        let n = if (p1 - p2).abs() >= f64::EPSILON {
            let (sin2, cos2) = p2.sin_cos();
            let m2 = m_compute(sin2, cos2, e);
            let t2 = t_compute(p2, sin2, e);
            (m1 / m2).ln() / (t1 / t2).ln()
        } else {
            sin1
        };
        let af = a * m1 / (n * t1.powf(n));
        let t0 = t_compute(phi0, phi0.sin(), e);
        let rho0 = af * t0.powf(n);

        Ok(Self {
            center_longitude: state.to_east(center_lon).to_radians(),
            state,
            center_latitude: center_lat,
            n,
            af,
            rho0,
        })
    }
}

impl TProjection for LambertConformal {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "LambertConformal"
    }

    fn true_scale_latitude(&self) -> f64 {
        self.center_latitude
    }

    fn uses_planetographic(&self) -> bool {
        true
    }

    fn projection_keywords(&self) -> &'static [&'static str] {
        &[
            "CenterLatitude",
            "CenterLongitude",
            "FirstStandardParallel",
            "SecondStandardParallel",
        ]
    }

    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let phi = lat.to_radians();
        let rh = if phi.abs() >= FRAC_PI_2 - f64::EPSILON {
            // The apex pole is a point, the other pole is at infinity
            if phi * self.n <= 0.0 {
                return None;
            }
            0.0
        } else {
            let ts = t_compute(phi, phi.sin(), self.state.eccentricity());
            self.af * ts.powf(self.n)
        };
        let theta = self.n * (lon.to_radians() - self.center_longitude);
        Some((rh * theta.sin(), self.rho0 - rh * theta.cos()))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let sign = self.n.signum();
        let dy = self.rho0 - y;
        let rh = sign * x.hypot(dy);
        let theta = if rh != 0.0 {
            (sign * x).atan2(sign * dy)
        } else {
            0.0
        };
        let phi = if rh != 0.0 || self.n > 0.0 {
            let ts = (rh / self.af).powf(1.0 / self.n);
            phi2_compute(self.state.eccentricity(), ts).ok()?
        } else {
            -FRAC_PI_2
        };
        let lambda = theta / self.n + self.center_longitude;
        Some((phi.to_degrees(), lambda.to_degrees()))
    }
}
