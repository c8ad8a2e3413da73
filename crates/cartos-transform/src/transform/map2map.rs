//! Map projection to map projection transform

use super::{Transform, in_raster, trimmed};
use cartos_proj::TProjection;

/// Output map position to input map position through universal ground.
///
/// When the input projection is equatorial cylindrical, a sample that
/// falls off the input is shifted by whole turns of longitude (the pixel
/// width of 360 degrees at the equator) until it lands on the input.
pub struct Map2Map<'a> {
    input: &'a mut dyn TProjection,
    output: &'a mut dyn TProjection,
    input_samples: usize,
    input_lines: usize,
    output_samples: usize,
    output_lines: usize,
    trim: bool,
    input_world_size: f64,
}

impl<'a> Map2Map<'a> {
    pub fn new(
        input: &'a mut dyn TProjection,
        input_samples: usize,
        input_lines: usize,
        output: &'a mut dyn TProjection,
        output_samples: usize,
        output_lines: usize,
    ) -> Self {
        let input_world_size = turn_width(input);
        Self {
            input,
            output,
            input_samples,
            input_lines,
            output_samples,
            output_lines,
            trim: false,
            input_world_size,
        }
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Pixel width of 360 degrees of longitude on the input, 0 when the
    /// input does not wrap.
    pub fn input_world_size(&self) -> f64 {
        self.input_world_size
    }
}

/// Width in whole pixels of a full turn of longitude at the equator.
fn turn_width(projection: &mut dyn TProjection) -> f64 {
    if !projection.is_equatorial_cylindrical() {
        return 0.0;
    }
    if !projection.set_universal_ground(0.0, 0.0) {
        return 0.0;
    }
    let start = (projection.world_x() + 0.5).floor();
    if !projection.set_universal_ground(0.0, 180.0) {
        return 0.0;
    }
    let end = (projection.world_x() + 0.5).floor();
    (end - start).abs() * 2.0
}

impl Transform for Map2Map<'_> {
    fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)> {
        if !self.output.set_world(sample, line) {
            return None;
        }
        if trimmed(self.trim, &*self.output) {
            return None;
        }
        let lat = self.output.universal_latitude();
        let lon = self.output.universal_longitude();
        if !self.input.set_universal_ground(lat, lon) {
            return None;
        }
        let mut in_sample = self.input.world_x();
        let in_line = self.input.world_y();

        if self.input_world_size > 0.0 {
            let last = self.input_samples as f64 + 0.5;
            while in_sample < 0.5 {
                in_sample += self.input_world_size;
            }
            while in_sample > last {
                in_sample -= self.input_world_size;
            }
        }

        in_raster(in_sample, in_line, self.input_samples, self.input_lines)
            .then_some((in_sample, in_line))
    }

    fn output_samples(&self) -> usize {
        self.output_samples
    }

    fn output_lines(&self) -> usize {
        self.output_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::Label;
    use cartos_proj::ProjectionFactory;
    use cartos_test::{equirectangular_mapping, sinusoidal_mapping, with_ground_range};

    #[test]
    fn test_turn_width_of_cylindrical_input() {
        let mut label = Label::from(with_ground_range(
            equirectangular_mapping(0.0, 180.0, 1000.0),
            -10.0,
            10.0,
            0.0,
            360.0,
        ));
        let factory = ProjectionFactory::default();
        let sized = factory.create_for_cube(&mut label).unwrap();
        assert_eq!(sized.samples, 360);
        let mut input = sized.projection.into_planetary().unwrap();
        let mut output = factory.create_from_cube(&label).unwrap().into_planetary().unwrap();
        let t = Map2Map::new(&mut *input, 360, 20, &mut *output, 360, 20);
        assert_eq!(t.input_world_size(), 360.0);
    }

    #[test]
    fn test_non_cylindrical_does_not_wrap() {
        let mut label = Label::from(with_ground_range(
            sinusoidal_mapping(0.0, 1000.0),
            -10.0,
            10.0,
            0.0,
            20.0,
        ));
        let factory = ProjectionFactory::default();
        let sized = factory.create_for_cube(&mut label).unwrap();
        let (ns, nl) = (sized.samples, sized.lines);
        let mut input = sized.projection.into_planetary().unwrap();
        let mut output = factory.create_from_cube(&label).unwrap().into_planetary().unwrap();
        let mut t = Map2Map::new(&mut *input, ns, nl, &mut *output, ns, nl);
        assert_eq!(t.input_world_size(), 0.0);

        // Same projection both sides: identity
        let (s, l) = t.xform(3.0, 4.0).unwrap();
        assert!((s - 3.0).abs() < 1e-9 && (l - 4.0).abs() < 1e-9);
    }
}
