//! Lambert azimuthal equal-area
//!
//! Spherical formulas on a sphere; on an ellipsoid the authalic latitude
//! is used, with separate polar and oblique/equatorial aspects.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{ProjectionState, TProjection, f64_or_default};
use crate::snyder::{m_compute, phi_from_q, q_compute};
use cartos_core::Label;
use cartos_core::conventions::to_planetographic;
use std::f64::consts::FRAC_PI_2;

const ANTIPODE_TOLERANCE: f64 = 1.0e-10;

#[derive(Debug, Clone, Copy)]
enum Aspect {
    Sphere,
    NorthPolar,
    SouthPolar,
    /// Oblique or equatorial aspect on the ellipsoid
    Oblique {
        sin_beta1: f64,
        cos_beta1: f64,
        rq: f64,
        d: f64,
    },
}

#[derive(Debug, Clone)]
pub struct LambertAzimuthalEqualArea {
    state: ProjectionState,
    center_latitude: f64,
    center_longitude: f64,
    sin_phi1: f64,
    cos_phi1: f64,
    /// `q` at the pole
    qp: f64,
    aspect: Aspect,
}

impl LambertAzimuthalEqualArea {
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
        if center_lat.abs() > 90.0 {
            return Err(ProjectionError::mapping(format!(
                "[CenterLatitude] of [{center_lat}] must be between -90 and 90"
            )));
        }

        let graphic = if state.is_planetographic() {
            center_lat
        } else {
            to_planetographic(center_lat, state.equatorial_radius(), state.polar_radius())
                .map_err(ProjectionError::mapping)?
        };
        let phi1 = graphic.to_radians();
        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let e = state.eccentricity();
        let a = state.equatorial_radius();
        let qp = q_compute(1.0, e);

        let aspect = if e < f64::EPSILON {
            Aspect::Sphere
        } else if (phi1 - FRAC_PI_2).abs() < f64::EPSILON {
            Aspect::NorthPolar
        } else if (phi1 + FRAC_PI_2).abs() < f64::EPSILON {
            Aspect::SouthPolar
        } else {
            let q1 = q_compute(sin_phi1, e);
            let beta1 = (q1 / qp).clamp(-1.0, 1.0).asin();
            let (sin_beta1, cos_beta1) = beta1.sin_cos();
            let rq = a * (qp / 2.0).sqrt();
            let m1 = m_compute(sin_phi1, cos_phi1, e);
            Aspect::Oblique {
                sin_beta1,
                cos_beta1,
                rq,
                d: a * m1 / (rq * cos_beta1),
            }
        };

        Ok(Self {
            center_longitude: state.to_east(center_lon).to_radians(),
            state,
            center_latitude: phi1,
            sin_phi1,
            cos_phi1,
            qp,
            aspect,
        })
    }
}

impl TProjection for LambertAzimuthalEqualArea {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "LambertAzimuthalEqualArea"
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
        let e = self.state.eccentricity();
        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_d, cos_d) = (lon.to_radians() - self.center_longitude).sin_cos();

        match self.aspect {
            Aspect::Sphere => {
                let term = 1.0 + self.sin_phi1 * sin_phi + self.cos_phi1 * cos_phi * cos_d;
                if term <= ANTIPODE_TOLERANCE {
                    return None;
                }
                let k = (2.0 / term).sqrt();
                Some((
                    a * k * cos_phi * sin_d,
                    a * k * (self.cos_phi1 * sin_phi - self.sin_phi1 * cos_phi * cos_d),
                ))
            }
            Aspect::NorthPolar | Aspect::SouthPolar => {
                let north = matches!(self.aspect, Aspect::NorthPolar);
                if (north && phi <= -FRAC_PI_2 + ANTIPODE_TOLERANCE)
                    || (!north && phi >= FRAC_PI_2 - ANTIPODE_TOLERANCE)
                {
                    return None;
                }
                let q = q_compute(sin_phi, e);
                if north {
                    let rho = a * (self.qp - q).max(0.0).sqrt();
                    Some((rho * sin_d, -rho * cos_d))
                } else {
                    let rho = a * (self.qp + q).max(0.0).sqrt();
                    Some((rho * sin_d, rho * cos_d))
                }
            }
            Aspect::Oblique {
                sin_beta1,
                cos_beta1,
                rq,
                d,
            } => {
                let q = q_compute(sin_phi, e);
                let beta = (q / self.qp).clamp(-1.0, 1.0).asin();
                let (sin_beta, cos_beta) = beta.sin_cos();
                let term = 1.0 + sin_beta1 * sin_beta + cos_beta1 * cos_beta * cos_d;
                if term <= ANTIPODE_TOLERANCE {
                    return None;
                }
                let b = rq * (2.0 / term).sqrt();
                Some((
                    b * d * cos_beta * sin_d,
                    (b / d) * (cos_beta1 * sin_beta - sin_beta1 * cos_beta * cos_d),
                ))
            }
        }
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let a = self.state.equatorial_radius();
        let e = self.state.eccentricity();
        let center = (
            self.center_latitude.to_degrees(),
            self.center_longitude.to_degrees(),
        );

        let (phi, dlambda) = match self.aspect {
            Aspect::Sphere => {
                let rho = x.hypot(y);
                if rho > 2.0 * a * (1.0 + ANTIPODE_TOLERANCE) {
                    return None;
                }
                if rho < f64::EPSILON {
                    return Some(center);
                }
                let c = 2.0 * (rho / (2.0 * a)).min(1.0).asin();
                let (sin_c, cos_c) = c.sin_cos();
                let phi = (cos_c * self.sin_phi1 + y * sin_c * self.cos_phi1 / rho)
                    .clamp(-1.0, 1.0)
                    .asin();
                let dl = (x * sin_c)
                    .atan2(rho * self.cos_phi1 * cos_c - y * self.sin_phi1 * sin_c);
                (phi, dl)
            }
            Aspect::NorthPolar | Aspect::SouthPolar => {
                let north = matches!(self.aspect, Aspect::NorthPolar);
                let rho = x.hypot(y);
                let q = self.qp - (rho / a).powi(2);
                if q < -self.qp - ANTIPODE_TOLERANCE {
                    return None;
                }
                let q = q.max(-self.qp);
                let phi = phi_from_q(if north { q } else { -q }, e).ok()?;
                let dl = if north { x.atan2(-y) } else { x.atan2(y) };
                (phi, dl)
            }
            Aspect::Oblique {
                sin_beta1,
                cos_beta1,
                rq,
                d,
            } => {
                let rho = (x / d).hypot(d * y);
                if rho > 2.0 * rq * (1.0 + ANTIPODE_TOLERANCE) {
                    return None;
                }
                if rho < f64::EPSILON {
                    return Some(center);
                }
                let ce = 2.0 * (rho / (2.0 * rq)).min(1.0).asin();
                let (sin_ce, cos_ce) = ce.sin_cos();
                let q = self.qp * (cos_ce * sin_beta1 + d * y * sin_ce * cos_beta1 / rho);
                let phi = phi_from_q(q.clamp(-self.qp, self.qp), e).ok()?;
                let dl = (x * sin_ce)
                    .atan2(d * rho * cos_beta1 * cos_ce - d * d * y * sin_beta1 * sin_ce);
                (phi, dl)
            }
        };
        Some((
            phi.to_degrees(),
            (self.center_longitude + dlambda).to_degrees(),
        ))
    }
}
