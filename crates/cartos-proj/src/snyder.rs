//! Ellipsoid helper functions from Snyder, "Map Projections - A Working
//! Manual" (USGS Professional Paper 1395)
//!
//! All angles are radians; `e` is the first eccentricity.

use crate::error::{ProjectionError, ProjectionResult};
use std::f64::consts::FRAC_PI_2;

const PHI2_MAX_ITERATIONS: usize = 45;
const PHI2_TOLERANCE: f64 = 1.0e-10;

/// Latitude from the isometric function `ts` (Snyder eq. 7-9 iterated).
///
/// # Errors
///
/// Fails when the iteration does not settle within 45 steps.
pub fn phi2_compute(e: f64, ts: f64) -> ProjectionResult<f64> {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..PHI2_MAX_ITERATIONS {
        let con = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan();
        let delta = (next - phi).abs();
        phi = next;
        if delta <= PHI2_TOLERANCE {
            return Ok(phi);
        }
    }
    Err(ProjectionError::Computation(
        "Failed to converge in phi2_compute".to_string(),
    ))
}

/// `m = cos(phi) / sqrt(1 - e^2 sin^2(phi))` (Snyder eq. 14-15).
pub fn m_compute(sin_phi: f64, cos_phi: f64, e: f64) -> f64 {
    let con = e * sin_phi;
    cos_phi / (1.0 - con * con).sqrt()
}

/// Isometric function `t` (Snyder eq. 15-9); zero at either pole.
pub fn t_compute(phi: f64, sin_phi: f64, e: f64) -> f64 {
    if (phi.abs() - FRAC_PI_2).abs() < f64::EPSILON {
        return 0.0;
    }
    let con = e * sin_phi;
    let denom = ((1.0 - con) / (1.0 + con)).powf(0.5 * e);
    (0.5 * (FRAC_PI_2 - phi)).tan() / denom
}

/// `sqrt((1+e)^(1+e) (1-e)^(1-e))`, used by polar aspects (Snyder eq. 21-34).
pub fn e4_compute(e: f64) -> f64 {
    ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
}

/// Authalic function `q` (Snyder eq. 3-12).
pub fn q_compute(sin_phi: f64, e: f64) -> f64 {
    if e < f64::EPSILON {
        return 2.0 * sin_phi;
    }
    let con = e * sin_phi;
    (1.0 - e * e)
        * (sin_phi / (1.0 - con * con) - (0.5 / e) * ((1.0 - con) / (1.0 + con)).ln())
}

/// Latitude from the authalic function `q` (Snyder eq. 3-16 iterated).
///
/// # Errors
///
/// Fails when the iteration does not settle.
pub fn phi_from_q(q: f64, e: f64) -> ProjectionResult<f64> {
    let mut phi = (0.5 * q).clamp(-1.0, 1.0).asin();
    if e < f64::EPSILON {
        return Ok(phi);
    }
    let e2 = e * e;
    for _ in 0..PHI2_MAX_ITERATIONS {
        let (sin_phi, cos_phi) = phi.sin_cos();
        if cos_phi.abs() < PHI2_TOLERANCE {
            return Ok(phi);
        }
        let con = e * sin_phi;
        let one_minus = 1.0 - con * con;
        let delta = one_minus * one_minus / (2.0 * cos_phi)
            * (q / (1.0 - e2) - sin_phi / one_minus
                + (0.5 / e) * ((1.0 - con) / (1.0 + con)).ln());
        phi += delta;
        if delta.abs() <= PHI2_TOLERANCE {
            return Ok(phi);
        }
    }
    Err(ProjectionError::Computation(
        "Failed to converge in phi_from_q".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: f64 = 0.0818191908426;

    #[test]
    fn test_phi2_inverts_t() {
        for deg in [-80.0_f64, -30.0, 0.0, 12.5, 60.0, 89.0] {
            let phi = deg.to_radians();
            let t = t_compute(phi, phi.sin(), E);
            let back = phi2_compute(E, t).unwrap();
            assert!((back - phi).abs() < 1e-9, "{deg}");
        }
    }

    #[test]
    fn test_phi_from_q_inverts_q() {
        for deg in [-70.0_f64, -5.0, 0.0, 33.0, 85.0] {
            let phi = deg.to_radians();
            let q = q_compute(phi.sin(), E);
            let back = phi_from_q(q, E).unwrap();
            assert!((back - phi).abs() < 1e-9, "{deg}");
        }
    }

    #[test]
    fn test_sphere_limits() {
        assert_eq!(e4_compute(0.0), 1.0);
        assert_eq!(q_compute(1.0, 0.0), 2.0);
        assert_eq!(m_compute(0.0, 1.0, E), 1.0);
        assert_eq!(t_compute(FRAC_PI_2, 1.0, E), 0.0);
    }
}
