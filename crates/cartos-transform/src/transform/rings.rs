//! Camera to ring-plane projection transforms

use super::{Transform, in_raster, ring_trimmed};
use cartos_core::Camera;
use cartos_proj::RingProjection;

/// Input image position to output ring-plane map position.
pub struct RingsCam2MapForward<'a> {
    camera: &'a mut dyn Camera,
    projection: &'a mut dyn RingProjection,
    output_samples: usize,
    output_lines: usize,
    trim: bool,
}

impl<'a> RingsCam2MapForward<'a> {
    pub fn new(
        camera: &'a mut dyn Camera,
        projection: &'a mut dyn RingProjection,
        output_samples: usize,
        output_lines: usize,
    ) -> Self {
        Self {
            camera,
            projection,
            output_samples,
            output_lines,
            trim: false,
        }
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

impl Transform for RingsCam2MapForward<'_> {
    fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)> {
        if !self.camera.set_image(sample, line) {
            return None;
        }
        let radius = self.camera.ring_radius()?;
        let lon = self.camera.universal_longitude();
        if !self.projection.set_universal_ground(radius, lon) {
            return None;
        }
        if ring_trimmed(self.trim, &*self.projection) {
            return None;
        }
        let (x, y) = (self.projection.world_x(), self.projection.world_y());
        in_raster(x, y, self.output_samples, self.output_lines).then_some((x, y))
    }

    fn output_samples(&self) -> usize {
        self.output_samples
    }

    fn output_lines(&self) -> usize {
        self.output_lines
    }

    fn is_band_dependent(&self) -> bool {
        !self.camera.is_band_independent()
    }

    fn band_change(&mut self, band: usize) {
        self.camera.set_band(band);
    }
}

/// Output ring-plane map position to input image position.
pub struct RingsCam2MapReverse<'a> {
    camera: &'a mut dyn Camera,
    projection: &'a mut dyn RingProjection,
    output_samples: usize,
    output_lines: usize,
    trim: bool,
}

impl<'a> RingsCam2MapReverse<'a> {
    pub fn new(
        camera: &'a mut dyn Camera,
        projection: &'a mut dyn RingProjection,
        output_samples: usize,
        output_lines: usize,
    ) -> Self {
        Self {
            camera,
            projection,
            output_samples,
            output_lines,
            trim: false,
        }
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

impl Transform for RingsCam2MapReverse<'_> {
    fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)> {
        if !self.projection.set_world(sample, line) {
            return None;
        }
        if ring_trimmed(self.trim, &*self.projection) {
            return None;
        }
        let radius = self.projection.universal_ring_radius();
        let lon = self.projection.universal_ring_longitude();
        if !self.camera.set_ring_ground(radius, lon) {
            return None;
        }
        let (in_sample, in_line) = (self.camera.sample(), self.camera.line());
        in_raster(
            in_sample,
            in_line,
            self.camera.samples(),
            self.camera.lines(),
        )
        .then_some((in_sample, in_line))
    }

    fn output_samples(&self) -> usize {
        self.output_samples
    }

    fn output_lines(&self) -> usize {
        self.output_lines
    }

    fn is_band_dependent(&self) -> bool {
        !self.camera.is_band_independent()
    }

    fn band_change(&mut self, band: usize) {
        self.camera.set_band(band);
    }
}
