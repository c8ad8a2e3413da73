//! Two-way coordinate mappings driven by the rubber-sheet engine
//!
//! A [`Transform`] maps a position on its *from* side to its *to* side.
//! Reverse transforms go from output pixel to input pixel and are driven
//! by the tiled resampler; forward transforms go from input pixel to output
//! pixel and are driven by the patch resampler. Either way
//! [`Transform::output_samples`] and [`Transform::output_lines`] give the
//! size of the raster being produced.
//!
//! Transforms borrow the camera and projections they compose; each call
//! updates their current position.

mod cam2map;
mod map2map;
mod rings;

pub use cam2map::{Cam2MapForward, Cam2MapReverse};
pub use map2map::Map2Map;
pub use rings::{RingsCam2MapForward, RingsCam2MapReverse};

use cartos_core::conventions::to_180_domain;
use cartos_proj::{RingProjection, TProjection};

/// Default maximum disagreement, degrees, between a ground point and the
/// ground point recovered by re-intersecting the camera at its image
/// position before the pixel is declared occluded.
pub const DEFAULT_OCCLUSION_TOLERANCE: f64 = 1.0e-5;

/// A mapping between pixel positions of two rasters.
pub trait Transform {
    /// Map a position on the from side to the to side, or `None` when it has
    /// no counterpart there.
    fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)>;

    fn output_samples(&self) -> usize;
    fn output_lines(&self) -> usize;

    /// True when the mapping differs between bands.
    fn is_band_dependent(&self) -> bool {
        false
    }

    /// Called when processing enters band `band`.
    fn band_change(&mut self, _band: usize) {}
}

/// True when `(sample, line)` lies on a raster of `samples x lines`,
/// edges included.
pub(crate) fn in_raster(sample: f64, line: f64, samples: usize, lines: usize) -> bool {
    sample >= 0.5 && line >= 0.5 && sample <= samples as f64 + 0.5 && line <= lines as f64 + 0.5
}

/// True when trimming is on and the projection's current position lies
/// outside its ground range.
pub(crate) fn trimmed(trim: bool, projection: &dyn TProjection) -> bool {
    trim
        && projection.has_ground_range()
        && (!projection.in_latitude_range(projection.latitude())
            || !projection.in_longitude_range(projection.longitude()))
}

/// Ring-plane counterpart of [`trimmed`].
pub(crate) fn ring_trimmed(trim: bool, projection: &dyn RingProjection) -> bool {
    trim
        && projection.has_ground_range()
        && (!projection.in_ring_radius_range(projection.ring_radius())
            || !projection.in_ring_longitude_range(projection.ring_longitude()))
}

/// True when two universal ground points differ by more than `tolerance`
/// degrees on either axis.
pub(crate) fn ground_differs(
    lat: f64,
    lon: f64,
    other_lat: f64,
    other_lon: f64,
    tolerance: f64,
) -> bool {
    (lat - other_lat).abs() > tolerance || to_180_domain(lon - other_lon).abs() > tolerance
}
