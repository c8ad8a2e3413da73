//! Synthetic cameras, cubes and mapping groups for tests

use cartos_core::conventions::to_180_domain;
use cartos_core::{
    Camera, CameraType, Cube, Group, Keyword, Label, PushFrameGeometry, Result, Target, TilingHint,
};
use std::f64::consts::PI;

/// Radius of the test body, metres. One degree of arc is 1000 metres.
pub const TEST_RADIUS: f64 = 180_000.0 / PI;

/// Name of the test body.
pub const TEST_TARGET: &str = "TestBody";

type Mask = Box<dyn Fn(f64, f64) -> bool>;

/// A camera whose ground intersection is an affine function of the image
/// position:
///
/// ```text
/// lat = lat0 + lat_per_sample * (s - 1) + lat_per_line * (l - 1)
/// lon = lon0 + lon_per_sample * (s - 1) + lon_per_line * (l - 1)
/// ```
///
/// Longitudes are reported in `[0, 360)`. Band `b` shifts longitudes by
/// `band_lon_shift * (b - 1)` when the camera is band dependent.
pub struct LinearCamera {
    target: Target,
    samples: usize,
    lines: usize,
    bands: usize,
    lat0: f64,
    lon0: f64,
    lat_per_sample: f64,
    lat_per_line: f64,
    lon_per_sample: f64,
    lon_per_line: f64,
    camera_type: CameraType,
    band_lon_shift: Option<f64>,
    push_frame: Option<PushFrameGeometry>,
    tiling: TilingHint,
    emission: f64,
    incidence: f64,
    mask: Option<Mask>,
    band: usize,
    sample: f64,
    line: f64,
    lat: f64,
    lon: f64,
}

impl LinearCamera {
    /// Camera with `lat = lat0 - (l - 1)`, `lon = lon0 + (s - 1)`: north up,
    /// one degree per pixel.
    pub fn north_up(samples: usize, lines: usize, lat0: f64, lon0: f64) -> Self {
        Self::affine(samples, lines, lat0, lon0, [0.0, -1.0], [1.0, 0.0])
    }

    /// Fully general affine camera. `lat_step`/`lon_step` are the
    /// `[per_sample, per_line]` increments in degrees.
    pub fn affine(
        samples: usize,
        lines: usize,
        lat0: f64,
        lon0: f64,
        lat_step: [f64; 2],
        lon_step: [f64; 2],
    ) -> Self {
        Self {
            target: Target::sphere(TEST_TARGET, TEST_RADIUS),
            samples,
            lines,
            bands: 1,
            lat0,
            lon0,
            lat_per_sample: lat_step[0],
            lat_per_line: lat_step[1],
            lon_per_sample: lon_step[0],
            lon_per_line: lon_step[1],
            camera_type: CameraType::Framing,
            band_lon_shift: None,
            push_frame: None,
            tiling: TilingHint::default(),
            emission: 0.0,
            incidence: 30.0,
            mask: None,
            band: 1,
            sample: 0.0,
            line: 0.0,
            lat: 0.0,
            lon: 0.0,
        }
    }

    pub fn with_camera_type(mut self, camera_type: CameraType) -> Self {
        self.camera_type = camera_type;
        self
    }

    pub fn with_bands(mut self, bands: usize) -> Self {
        self.bands = bands;
        self
    }

    /// Make the camera band dependent.
    pub fn with_band_shift(mut self, lon_shift: f64) -> Self {
        self.band_lon_shift = Some(lon_shift);
        self
    }

    pub fn with_push_frame(mut self, geometry: PushFrameGeometry) -> Self {
        self.camera_type = CameraType::PushFrame;
        self.push_frame = Some(geometry);
        self
    }

    pub fn with_tiling(mut self, tiling: TilingHint) -> Self {
        self.tiling = tiling;
        self
    }

    pub fn with_angles(mut self, emission: f64, incidence: f64) -> Self {
        self.emission = emission;
        self.incidence = incidence;
        self
    }

    /// Restrict intersections to image positions where `mask(s, l)` is true.
    pub fn with_mask(mut self, mask: impl Fn(f64, f64) -> bool + 'static) -> Self {
        self.mask = Some(Box::new(mask));
        self
    }

    fn band_shift(&self) -> f64 {
        match self.band_lon_shift {
            Some(shift) => shift * (self.band as f64 - 1.0),
            None => 0.0,
        }
    }

    fn raw_ground(&self, sample: f64, line: f64) -> (f64, f64) {
        let ds = sample - 1.0;
        let dl = line - 1.0;
        let lat = self.lat0 + self.lat_per_sample * ds + self.lat_per_line * dl;
        let lon = self.lon0 + self.band_shift() + self.lon_per_sample * ds + self.lon_per_line * dl;
        (lat, lon)
    }

    /// Largest ground step of one pixel, degrees.
    fn degrees_per_pixel(&self) -> f64 {
        let lat = self.lat_per_sample.hypot(self.lat_per_line);
        let lon = self.lon_per_sample.hypot(self.lon_per_line);
        lat.max(lon)
    }
}

impl Camera for LinearCamera {
    fn samples(&self) -> usize {
        self.samples
    }

    fn lines(&self) -> usize {
        self.lines
    }

    fn bands(&self) -> usize {
        self.bands
    }

    fn set_image(&mut self, sample: f64, line: f64) -> bool {
        self.sample = sample;
        self.line = line;
        if let Some(mask) = &self.mask {
            if !mask(sample, line) {
                return false;
            }
        }
        let (lat, lon) = self.raw_ground(sample, line);
        if !(-90.0..=90.0).contains(&lat) {
            return false;
        }
        self.lat = lat;
        self.lon = lon.rem_euclid(360.0);
        true
    }

    fn set_universal_ground(&mut self, lat: f64, lon: f64) -> bool {
        let det = self.lat_per_sample * self.lon_per_line - self.lat_per_line * self.lon_per_sample;
        if det.abs() < f64::EPSILON {
            return false;
        }
        // Unwrap relative to the image centre so seam-crossing images invert
        let (_, clon) = self.raw_ground(
            (self.samples as f64 + 1.0) / 2.0,
            (self.lines as f64 + 1.0) / 2.0,
        );
        let unwrapped = clon + to_180_domain(lon - clon);
        let base_lon = self.lon0 + self.band_shift();
        let dlat = lat - self.lat0;
        let dlon = unwrapped - base_lon;
        let ds = (dlat * self.lon_per_line - self.lat_per_line * dlon) / det;
        let dl = (self.lat_per_sample * dlon - self.lon_per_sample * dlat) / det;
        self.sample = ds + 1.0;
        self.line = dl + 1.0;
        self.lat = lat;
        self.lon = lon.rem_euclid(360.0);
        match &self.mask {
            Some(mask) => mask(self.sample, self.line),
            None => true,
        }
    }

    fn universal_latitude(&self) -> f64 {
        self.lat
    }

    fn universal_longitude(&self) -> f64 {
        self.lon
    }

    fn sample(&self) -> f64 {
        self.sample
    }

    fn line(&self) -> f64 {
        self.line
    }

    fn pixel_resolution(&self) -> f64 {
        self.degrees_per_pixel() * TEST_RADIUS * PI / 180.0
    }

    fn phase_angle(&self) -> f64 {
        self.incidence + self.emission
    }

    fn emission_angle(&self) -> f64 {
        self.emission
    }

    fn incidence_angle(&self) -> f64 {
        self.incidence
    }

    fn camera_type(&self) -> CameraType {
        self.camera_type
    }

    fn target(&self) -> &Target {
        &self.target
    }

    fn is_band_independent(&self) -> bool {
        self.band_lon_shift.is_none()
    }

    fn band(&self) -> usize {
        self.band
    }

    fn set_band(&mut self, band: usize) {
        self.band = band;
    }

    fn geometric_tiling_hint(&self) -> TilingHint {
        self.tiling
    }

    fn push_frame_geometry(&self) -> Option<PushFrameGeometry> {
        self.push_frame
    }
}

/// A camera looking down on a ring plane:
///
/// ```text
/// radius = radius0 + radius_per_sample * (s - 1)
/// lon    = lon0 + lon_per_line * (l - 1)        (counterclockwise)
/// ```
pub struct RingCamera {
    target: Target,
    samples: usize,
    lines: usize,
    radius0: f64,
    radius_per_sample: f64,
    lon0: f64,
    lon_per_line: f64,
    sample: f64,
    line: f64,
    radius: f64,
    lon: f64,
}

impl RingCamera {
    pub fn new(
        samples: usize,
        lines: usize,
        radius0: f64,
        radius_per_sample: f64,
        lon0: f64,
        lon_per_line: f64,
    ) -> Self {
        Self {
            target: Target::sphere(TEST_TARGET, TEST_RADIUS),
            samples,
            lines,
            radius0,
            radius_per_sample,
            lon0,
            lon_per_line,
            sample: 0.0,
            line: 0.0,
            radius: 0.0,
            lon: 0.0,
        }
    }
}

impl Camera for RingCamera {
    fn samples(&self) -> usize {
        self.samples
    }

    fn lines(&self) -> usize {
        self.lines
    }

    fn bands(&self) -> usize {
        1
    }

    fn set_image(&mut self, sample: f64, line: f64) -> bool {
        self.sample = sample;
        self.line = line;
        let radius = self.radius0 + self.radius_per_sample * (sample - 1.0);
        if radius < 0.0 {
            return false;
        }
        self.radius = radius;
        self.lon = (self.lon0 + self.lon_per_line * (line - 1.0)).rem_euclid(360.0);
        true
    }

    fn set_universal_ground(&mut self, _lat: f64, _lon: f64) -> bool {
        false
    }

    fn set_ring_ground(&mut self, radius: f64, lon: f64) -> bool {
        if self.radius_per_sample == 0.0 || self.lon_per_line == 0.0 {
            return false;
        }
        let clon = self.lon0 + self.lon_per_line * (self.lines as f64 - 1.0) / 2.0;
        let unwrapped = clon + to_180_domain(lon - clon);
        self.sample = (radius - self.radius0) / self.radius_per_sample + 1.0;
        self.line = (unwrapped - self.lon0) / self.lon_per_line + 1.0;
        self.radius = radius;
        self.lon = lon.rem_euclid(360.0);
        true
    }

    fn ring_radius(&self) -> Option<f64> {
        Some(self.radius)
    }

    fn universal_latitude(&self) -> f64 {
        0.0
    }

    fn universal_longitude(&self) -> f64 {
        self.lon
    }

    fn sample(&self) -> f64 {
        self.sample
    }

    fn line(&self) -> f64 {
        self.line
    }

    fn pixel_resolution(&self) -> f64 {
        self.radius_per_sample.abs()
    }

    fn phase_angle(&self) -> f64 {
        0.0
    }

    fn emission_angle(&self) -> f64 {
        0.0
    }

    fn incidence_angle(&self) -> f64 {
        0.0
    }

    fn camera_type(&self) -> CameraType {
        CameraType::Framing
    }

    fn target(&self) -> &Target {
        &self.target
    }
}

/// A camera looking straight down on a pole. Distance from the image
/// centre is colatitude, direction is longitude:
///
/// ```text
/// r   = degrees_per_pixel * hypot(s - cs, l - cl)
/// lat = ±(90 - r)
/// lon = atan2(s - cs, cl - l)        (0 at the top, 90 to the right)
/// ```
pub struct PolarCamera {
    target: Target,
    samples: usize,
    lines: usize,
    degrees_per_pixel: f64,
    pole: f64,
    sample: f64,
    line: f64,
    lat: f64,
    lon: f64,
}

impl PolarCamera {
    /// `pole` is `90.0` or `-90.0`.
    pub fn new(samples: usize, lines: usize, degrees_per_pixel: f64, pole: f64) -> Self {
        Self {
            target: Target::sphere(TEST_TARGET, TEST_RADIUS),
            samples,
            lines,
            degrees_per_pixel,
            pole,
            sample: 0.0,
            line: 0.0,
            lat: 0.0,
            lon: 0.0,
        }
    }

    fn centre(&self) -> (f64, f64) {
        ((self.samples as f64 + 1.0) / 2.0, (self.lines as f64 + 1.0) / 2.0)
    }
}

impl Camera for PolarCamera {
    fn samples(&self) -> usize {
        self.samples
    }

    fn lines(&self) -> usize {
        self.lines
    }

    fn bands(&self) -> usize {
        1
    }

    fn set_image(&mut self, sample: f64, line: f64) -> bool {
        self.sample = sample;
        self.line = line;
        let (cs, cl) = self.centre();
        let (x, y) = (sample - cs, cl - line);
        let colat = self.degrees_per_pixel * x.hypot(y);
        if colat > 180.0 {
            return false;
        }
        self.lat = self.pole.signum() * (90.0 - colat);
        self.lon = x.atan2(y).to_degrees().rem_euclid(360.0);
        true
    }

    fn set_universal_ground(&mut self, lat: f64, lon: f64) -> bool {
        if self.degrees_per_pixel == 0.0 {
            return false;
        }
        let colat = 90.0 - self.pole.signum() * lat;
        let r = colat / self.degrees_per_pixel;
        let (cs, cl) = self.centre();
        let theta = lon.to_radians();
        self.sample = cs + r * theta.sin();
        self.line = cl - r * theta.cos();
        self.lat = lat;
        self.lon = lon.rem_euclid(360.0);
        true
    }

    fn universal_latitude(&self) -> f64 {
        self.lat
    }

    fn universal_longitude(&self) -> f64 {
        self.lon
    }

    fn sample(&self) -> f64 {
        self.sample
    }

    fn line(&self) -> f64 {
        self.line
    }

    fn pixel_resolution(&self) -> f64 {
        self.degrees_per_pixel * TEST_RADIUS * PI / 180.0
    }

    fn phase_angle(&self) -> f64 {
        30.0
    }

    fn emission_angle(&self) -> f64 {
        0.0
    }

    fn incidence_angle(&self) -> f64 {
        30.0
    }

    fn camera_type(&self) -> CameraType {
        CameraType::Framing
    }

    fn target(&self) -> &Target {
        &self.target
    }
}

// ============================================================================
// Cubes
// ============================================================================

/// Cube with every sample set to `value`.
pub fn cube_with_value(samples: usize, lines: usize, bands: usize, value: f64) -> Result<Cube> {
    Cube::new_with_value(samples, lines, bands, value)
}

/// Cube whose samples encode their position: `1000 * band + 100 * line + sample`
/// for small cubes, unique for `samples, lines < 100`.
pub fn ramp_cube(samples: usize, lines: usize, bands: usize) -> Result<Cube> {
    let mut data = Vec::with_capacity(samples * lines * bands);
    for b in 1..=bands {
        for l in 1..=lines {
            for s in 1..=samples {
                data.push((1000 * b + 100 * l + s) as f64);
            }
        }
    }
    Cube::from_data(samples, lines, bands, data)
}

// ============================================================================
// Mapping groups
// ============================================================================

fn base_mapping(projection: &str, pixel_resolution: f64) -> Group {
    let mut g = Group::new("Mapping");
    g.set(Keyword::new("ProjectionName", projection));
    g.set(Keyword::new("TargetName", TEST_TARGET));
    g.set(Keyword::new("EquatorialRadius", TEST_RADIUS).with_unit("meters"));
    g.set(Keyword::new("PolarRadius", TEST_RADIUS).with_unit("meters"));
    g.set(Keyword::new("LatitudeType", "Planetocentric"));
    g.set(Keyword::new("LongitudeDirection", "PositiveEast"));
    g.set(Keyword::new("LongitudeDomain", 360));
    g.set(Keyword::new("PixelResolution", pixel_resolution).with_unit("meters/pixel"));
    g
}

/// Sinusoidal mapping on the test body.
pub fn sinusoidal_mapping(center_longitude: f64, pixel_resolution: f64) -> Group {
    let mut g = base_mapping("Sinusoidal", pixel_resolution);
    g.set(Keyword::new("CenterLongitude", center_longitude).with_unit("degrees"));
    g
}

/// Equirectangular mapping on the test body.
pub fn equirectangular_mapping(
    center_latitude: f64,
    center_longitude: f64,
    pixel_resolution: f64,
) -> Group {
    let mut g = base_mapping("Equirectangular", pixel_resolution);
    g.set(Keyword::new("CenterLatitude", center_latitude).with_unit("degrees"));
    g.set(Keyword::new("CenterLongitude", center_longitude).with_unit("degrees"));
    g
}

/// Add a ground range to a mapping group.
pub fn with_ground_range(
    mut mapping: Group,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
) -> Group {
    mapping.set(Keyword::new("MinimumLatitude", min_lat));
    mapping.set(Keyword::new("MaximumLatitude", max_lat));
    mapping.set(Keyword::new("MinimumLongitude", min_lon));
    mapping.set(Keyword::new("MaximumLongitude", max_lon));
    mapping
}

/// A label holding a single mapping group.
pub fn mapping_label(mapping: Group) -> Label {
    Label::from(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_camera_inverse() {
        let mut cam = LinearCamera::north_up(10, 10, 5.0, 355.0);
        assert!(cam.set_image(3.0, 4.0));
        let (lat, lon) = (cam.universal_latitude(), cam.universal_longitude());
        assert_eq!(lat, 2.0);
        assert_eq!(lon, 357.0);
        assert!(cam.set_universal_ground(lat, lon));
        assert!((cam.sample() - 3.0).abs() < 1e-12);
        assert!((cam.line() - 4.0).abs() < 1e-12);

        // Across the seam
        assert!(cam.set_image(8.0, 1.0));
        assert_eq!(cam.universal_longitude(), 2.0);
        assert!(cam.set_universal_ground(5.0, 2.0));
        assert!((cam.sample() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_resolution_one_degree() {
        let cam = LinearCamera::north_up(2, 2, 0.0, 0.0);
        assert!((cam.pixel_resolution() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_unique() {
        let cube = ramp_cube(3, 2, 2).unwrap();
        use cartos_core::RasterView;
        assert_eq!(cube.read(3, 2, 2), 2203.0);
    }
}
