//! Camera to map projection transforms

use super::{Transform, ground_differs, in_raster, trimmed};
use cartos_core::Camera;
use cartos_proj::TProjection;

/// Input image position to output map position.
///
/// `set_image` on the camera, then `set_universal_ground` on the
/// projection. Used by the forward patch resampler.
pub struct Cam2MapForward<'a> {
    camera: &'a mut dyn Camera,
    projection: &'a mut dyn TProjection,
    output_samples: usize,
    output_lines: usize,
    trim: bool,
}

impl<'a> Cam2MapForward<'a> {
    pub fn new(
        camera: &'a mut dyn Camera,
        projection: &'a mut dyn TProjection,
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

    /// Reject ground points outside the projection's ground range.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

impl Transform for Cam2MapForward<'_> {
    fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)> {
        if !self.camera.set_image(sample, line) {
            return None;
        }
        let lat = self.camera.universal_latitude();
        let lon = self.camera.universal_longitude();
        if !self.projection.set_universal_ground(lat, lon) {
            return None;
        }
        if trimmed(self.trim, &*self.projection) {
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

/// Output map position to input image position.
///
/// `set_world` on the projection, then `set_universal_ground` on the
/// camera. With occlusion testing on, the camera is re-intersected at the
/// image position it returned; a ground point that does not come back
/// within tolerance is hidden from the camera.
pub struct Cam2MapReverse<'a> {
    camera: &'a mut dyn Camera,
    projection: &'a mut dyn TProjection,
    output_samples: usize,
    output_lines: usize,
    trim: bool,
    occlusion_tolerance: Option<f64>,
}

impl<'a> Cam2MapReverse<'a> {
    pub fn new(
        camera: &'a mut dyn Camera,
        projection: &'a mut dyn TProjection,
        output_samples: usize,
        output_lines: usize,
    ) -> Self {
        Self {
            camera,
            projection,
            output_samples,
            output_lines,
            trim: false,
            occlusion_tolerance: None,
        }
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Enable occlusion testing with a tolerance in degrees.
    pub fn with_occlusion(mut self, tolerance: f64) -> Self {
        self.occlusion_tolerance = Some(tolerance);
        self
    }

    fn occluded(&mut self, lat: f64, lon: f64, sample: f64, line: f64, tolerance: f64) -> bool {
        if !self.camera.set_image(sample, line) {
            return true;
        }
        ground_differs(
            lat,
            lon,
            self.camera.universal_latitude(),
            self.camera.universal_longitude(),
            tolerance,
        )
    }
}

impl Transform for Cam2MapReverse<'_> {
    fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)> {
        if !self.projection.set_world(sample, line) {
            return None;
        }
        if trimmed(self.trim, &*self.projection) {
            return None;
        }
        let lat = self.projection.universal_latitude();
        let lon = self.projection.universal_longitude();
        if !self.camera.set_universal_ground(lat, lon) {
            return None;
        }
        let (in_sample, in_line) = (self.camera.sample(), self.camera.line());
        if !in_raster(
            in_sample,
            in_line,
            self.camera.samples(),
            self.camera.lines(),
        ) {
            return None;
        }
        if let Some(tolerance) = self.occlusion_tolerance {
            if self.occluded(lat, lon, in_sample, in_line, tolerance) {
                return None;
            }
        }
        Some((in_sample, in_line))
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

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::Label;
    use cartos_proj::{ProjectionFactory, SizedProjection};
    use cartos_test::{LinearCamera, sinusoidal_mapping, with_ground_range};

    fn sized(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> SizedProjection {
        let mapping = with_ground_range(
            sinusoidal_mapping(0.0, 1000.0),
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        );
        let mut label = Label::from(mapping);
        ProjectionFactory::default().create_for_cube(&mut label).unwrap()
    }

    #[test]
    fn test_reverse_then_forward() {
        let mut camera = LinearCamera::north_up(10, 10, 9.0, 0.0);
        let SizedProjection {
            projection,
            samples,
            lines,
        } = sized(0.0, 9.0, 0.0, 9.0);
        let mut projection = projection.into_planetary().unwrap();

        let (is, il) = {
            let mut reverse = Cam2MapReverse::new(&mut camera, &mut *projection, samples, lines);
            reverse.xform(1.0, 5.0).unwrap()
        };
        let mut forward = Cam2MapForward::new(&mut camera, &mut *projection, samples, lines);
        let (os, ol) = forward.xform(is, il).unwrap();
        assert!((os - 1.0).abs() < 1e-9);
        assert!((ol - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_rejects_positions_off_the_image() {
        let mut camera = LinearCamera::north_up(4, 4, 9.0, 0.0);
        let sized = sized(0.0, 9.0, 0.0, 9.0);
        let mut projection = sized.projection.into_planetary().unwrap();
        let mut reverse =
            Cam2MapReverse::new(&mut camera, &mut *projection, sized.samples, sized.lines);
        // Longitude 8.5 is past the 4-sample camera
        assert!(reverse.xform(9.0, 1.0).is_none());
    }

    #[test]
    fn test_trim_uses_ground_range() {
        let mut camera = LinearCamera::north_up(20, 20, 9.0, 0.0);
        let sized = sized(0.0, 9.0, 0.0, 9.0);
        let mut projection = sized.projection.into_planetary().unwrap();
        // At the equator world sample 0.6 is longitude 0.1, sample 0.4 is -0.1
        let position = (0.6, 9.0);
        {
            let mut reverse =
                Cam2MapReverse::new(&mut camera, &mut *projection, sized.samples, sized.lines);
            assert!(reverse.xform(position.0, position.1).is_some());
        }
        let mut reverse =
            Cam2MapReverse::new(&mut camera, &mut *projection, sized.samples, sized.lines)
                .with_trim(true);
        assert!(reverse.xform(position.0 - 0.2, position.1).is_none());
    }

    /// Ground points east of longitude 5 are hidden behind terrain that the
    /// forward intersection hits a tenth of a degree further north.
    struct Overhang(LinearCamera);

    impl Camera for Overhang {
        fn samples(&self) -> usize {
            self.0.samples()
        }
        fn lines(&self) -> usize {
            self.0.lines()
        }
        fn bands(&self) -> usize {
            self.0.bands()
        }
        fn set_image(&mut self, sample: f64, line: f64) -> bool {
            self.0.set_image(sample, line)
        }
        fn set_universal_ground(&mut self, lat: f64, lon: f64) -> bool {
            self.0.set_universal_ground(lat, lon)
        }
        fn universal_latitude(&self) -> f64 {
            let lat = self.0.universal_latitude();
            if self.0.universal_longitude() > 5.0 { lat + 0.1 } else { lat }
        }
        fn universal_longitude(&self) -> f64 {
            self.0.universal_longitude()
        }
        fn sample(&self) -> f64 {
            self.0.sample()
        }
        fn line(&self) -> f64 {
            self.0.line()
        }
        fn pixel_resolution(&self) -> f64 {
            self.0.pixel_resolution()
        }
        fn phase_angle(&self) -> f64 {
            self.0.phase_angle()
        }
        fn emission_angle(&self) -> f64 {
            self.0.emission_angle()
        }
        fn incidence_angle(&self) -> f64 {
            self.0.incidence_angle()
        }
        fn camera_type(&self) -> cartos_core::CameraType {
            self.0.camera_type()
        }
        fn target(&self) -> &cartos_core::Target {
            self.0.target()
        }
    }

    #[test]
    fn test_occlusion_detects_disagreement() {
        let mut camera = Overhang(LinearCamera::north_up(10, 10, 9.0, 0.0));
        let sized = sized(0.0, 9.0, 0.0, 9.0);
        let mut projection = sized.projection.into_planetary().unwrap();
        let (ns, nl) = (sized.samples, sized.lines);

        let mut plain = Cam2MapReverse::new(&mut camera, &mut *projection, ns, nl);
        assert!(plain.xform(8.0, 5.0).is_some());

        let mut reverse =
            Cam2MapReverse::new(&mut camera, &mut *projection, ns, nl).with_occlusion(1e-5);
        assert!(reverse.xform(2.0, 5.0).is_some());
        assert!(reverse.xform(8.0, 5.0).is_none());
    }
}
