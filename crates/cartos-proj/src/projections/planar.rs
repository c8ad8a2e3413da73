//! Planar ring projection: polar coordinates in the ring plane
//!
//! ```text
//! x = r cos(lon - lon0)
//! y = r sin(lon - lon0)
//! ```

use crate::error::{ProjectionError, ProjectionResult};
use crate::ring::{RingProjection, RingState, ring_f64_or_default};
use cartos_core::Label;

#[derive(Debug, Clone)]
pub struct Planar {
    state: RingState,
    /// Counterclockwise, radians
    center_longitude: f64,
    center_radius: f64,
}

impl Planar {
    /// Build from a label's `Mapping` group. `CenterRingLongitude` and
    /// `CenterRingRadius` default to the middle of the ring range.
    pub fn new(label: &Label, allow_defaults: bool) -> ProjectionResult<Self> {
        let mut state = RingState::from_label(label, allow_defaults)?;
        let range = state.range();
        let mapping = state.mapping_group_mut();
        let center_lon = ring_f64_or_default(
            mapping,
            "CenterRingLongitude",
            Some(range.map_or(0.0, |r| (r.min_longitude + r.max_longitude) / 2.0)),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        let center_radius = ring_f64_or_default(
            mapping,
            "CenterRingRadius",
            range.map(|r| (r.min_radius + r.max_radius) / 2.0),
            allow_defaults,
        )
        .map_err(ProjectionError::mapping)?;
        if center_radius < 0.0 {
            return Err(ProjectionError::mapping(format!(
                "[CenterRingRadius] of [{center_radius}] must not be negative"
            )));
        }
        Ok(Self {
            center_longitude: state.to_counterclockwise(center_lon).to_radians(),
            state,
            center_radius,
        })
    }
}

impl RingProjection for Planar {
    fn state(&self) -> &RingState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RingState {
        &mut self.state
    }

    fn name(&self) -> &'static str {
        "Planar"
    }

    fn true_scale_ring_radius(&self) -> f64 {
        self.center_radius
    }

    fn projection_keywords(&self) -> &'static [&'static str] {
        &["CenterRingLongitude", "CenterRingRadius"]
    }

    fn project(&self, radius: f64, lon: f64) -> Option<(f64, f64)> {
        let delta = lon.to_radians() - self.center_longitude;
        Some((radius * delta.cos(), radius * delta.sin()))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let radius = x.hypot(y);
        let lon = self.center_longitude + y.atan2(x);
        Some((radius, lon.to_degrees()))
    }
}
