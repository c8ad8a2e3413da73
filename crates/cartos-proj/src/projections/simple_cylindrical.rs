//! Simple cylindrical (plate carree on the equatorial radius)

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{ProjectionState, TProjection, f64_or_default};
use cartos_core::Label;
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone)]
pub struct SimpleCylindrical {
    state: ProjectionState,
    center_longitude: f64,
}

impl SimpleCylindrical {
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
}

impl TProjection for SimpleCylindrical {
    fn state(&self) -> &ProjectionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProjectionState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "SimpleCylindrical"
    }

    fn is_equatorial_cylindrical(&self) -> bool {
        true
    }

    fn projection_keywords(&self) -> &'static [&'static str] {
        &["CenterLongitude"]
    }

    fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let a = self.state.equatorial_radius();
        Some((
            a * (lon.to_radians() - self.center_longitude),
            a * lat.to_radians(),
        ))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let a = self.state.equatorial_radius();
        let phi = y / a;
        if phi.abs() > FRAC_PI_2 + f64::EPSILON {
            return None;
        }
        let lambda = self.center_longitude + x / a;
        Some((phi.clamp(-FRAC_PI_2, FRAC_PI_2).to_degrees(), lambda.to_degrees()))
    }
}
