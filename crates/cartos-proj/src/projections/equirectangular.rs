//! Equirectangular, true to scale along the centre latitude
//!
//! The sphere radius is the local radius at the centre latitude.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{ProjectionState, TProjection, f64_or_default};
use cartos_core::Label;
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct Equirectangular {
    state: ProjectionState,
    center_latitude: f64,
    center_longitude: f64,
    cos_center_latitude: f64,
    radius: f64,
}

impl Equirectangular {
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

        let radius = state.local_radius(center_lat);
        let center_latitude = center_lat.to_radians();
        Ok(Self {
            center_longitude: state.to_east(center_lon).to_radians(),
            state,
            center_latitude,
            cos_center_latitude: center_latitude.cos(),
            radius,
        })
    }
}

impl TProjection for Equirectangular {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "Equirectangular"
    }

    fn is_equatorial_cylindrical(&self) -> bool {
        true
    }

    fn true_scale_latitude(&self) -> f64 {
        self.center_latitude.to_degrees()
    }

    fn projection_keywords(&self) -> &'static [&'static str] {
        &["CenterLatitude", "CenterLongitude"]
    }

    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let delta = lon.to_radians() - self.center_longitude;
        Some((
            self.radius * delta * self.cos_center_latitude,
            self.radius * lat.to_radians(),
        ))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let phi = y / self.radius;
        if phi.abs() > FRAC_PI_2 + f64::EPSILON {
            return None;
        }
        let lambda = self.center_longitude + x / (self.radius * self.cos_center_latitude);
        Some((phi.clamp(-FRAC_PI_2, FRAC_PI_2).to_degrees(), lambda.to_degrees()))
    }
}
