//! Map-projected mosaics
//!
//! Inputs and mosaic share one projection; an input's position in the
//! mosaic follows from the projection coordinate of its first pixel.
//! Under an equatorial cylindrical projection the input is also repeated
//! every 360 degrees of longitude wherever that lands inside the mosaic.

use crate::error::{MosaicError, MosaicResult};
use crate::mosaic::Mosaic;
use crate::options::MosaicOptions;
use cartos_core::{Cube, Group, Keyword, PixelType, RasterView};
use cartos_proj::{MapProjection, ProjectionFactory, WorldMapper};
use tracing::{debug, info};

/// Mapping keywords that may differ between inputs of one mosaic.
const POSITION_KEYWORDS: [&str; 6] = [
    "UpperLeftCornerX",
    "UpperLeftCornerY",
    "MinimumLatitude",
    "MaximumLatitude",
    "MinimumLongitude",
    "MaximumLongitude",
];

/// Places map-projected cubes into a map-projected mosaic.
#[derive(Default)]
pub struct MapMosaic {
    factory: ProjectionFactory,
    mosaic: Mosaic,
}

/// Mapping group without the keywords that locate a particular cube.
fn projection_only(mapping: Group) -> Group {
    let mut mapping = mapping;
    for name in POSITION_KEYWORDS {
        mapping.remove_keyword(name);
    }
    mapping
}

fn world_mapper(projection: &MapProjection, file: &str) -> MosaicResult<WorldMapper> {
    projection.world_mapper().copied().ok_or_else(|| {
        MosaicError::Programmer(format!("The cube [{file}] has no world mapping"))
    })
}

/// Whole pixels spanned by `extent` at `resolution`, tolerating rounding
/// noise just above a whole number.
fn pixel_count(extent: f64, resolution: f64) -> usize {
    let n = extent / resolution;
    let n = if (n - n.round()).abs() < 1.0e-6 {
        n.round()
    } else {
        n.ceil()
    };
    (n.max(1.0) + 0.5) as usize
}

/// Width in pixels of 360 degrees of longitude, for projections where it
/// is fixed.
fn wrap_width(projection: &mut MapProjection) -> Option<i64> {
    if !projection.is_equatorial_cylindrical() {
        return None;
    }
    let (at_180, at_0) = match projection {
        MapProjection::Planetary(p) => {
            if !p.set_ground(0.0, 180.0) {
                return None;
            }
            let x180 = p.world_x();
            if !p.set_ground(0.0, 0.0) {
                return None;
            }
            (x180, p.world_x())
        }
        MapProjection::Ring(p) => {
            let radius = p.true_scale_ring_radius();
            if !p.set_ground(radius, 180.0) {
                return None;
            }
            let x180 = p.world_x();
            if !p.set_ground(radius, 0.0) {
                return None;
            }
            (x180, p.world_x())
        }
    };
    let width = (2.0 * (at_180 - at_0).abs()).round() as i64;
    (width > 0).then_some(width)
}

impl MapMosaic {
    pub fn new(options: MosaicOptions) -> Self {
        Self {
            factory: ProjectionFactory::default(),
            mosaic: Mosaic::new(options),
        }
    }

    pub fn with_factory(factory: ProjectionFactory, options: MosaicOptions) -> Self {
        Self {
            factory,
            mosaic: Mosaic::new(options),
        }
    }

    pub fn mosaic(&self) -> &Mosaic {
        &self.mosaic
    }

    /// Build an empty mosaic covering every input.
    ///
    /// The output carries the inputs' mapping with its upper-left corner
    /// moved to the combined extent and, when the inputs have ground
    /// ranges, the union of those ranges. It has as many value bands as the
    /// input with the most bands.
    ///
    /// # Errors
    ///
    /// Fails for an empty input list, inputs that are not map projected, or
    /// inputs whose projections differ.
    pub fn create_output(
        &self,
        inputs: &[&dyn RasterView],
        pixel_type: PixelType,
    ) -> MosaicResult<Cube> {
        let Some(first) = inputs.first() else {
            return Err(MosaicError::Programmer(
                "A mosaic needs at least one input".to_string(),
            ));
        };
        let reference = self.factory.create_from_cube(first.label())?;
        let reference_mapping = projection_only(reference.mapping());
        let resolution = world_mapper(&reference, first.file_name())?.resolution();

        let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
        let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
        let mut ground: Option<[f64; 4]> = None;
        let mut bands = 0;
        for input in inputs {
            let projection = self.factory.create_from_cube(input.label())?;
            if projection_only(projection.mapping()) != reference_mapping {
                return Err(MosaicError::MappingMismatch {
                    input: input.file_name().to_string(),
                    other: first.file_name().to_string(),
                });
            }
            let mapper = world_mapper(&projection, input.file_name())?;
            for (wx, wy) in [(0.5, 0.5), (input.samples() as f64 + 0.5, input.lines() as f64 + 0.5)] {
                let (x, y) = (mapper.projection_x(wx), mapper.projection_y(wy));
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
            let mapping = projection.mapping_group();
            let range = [
                "MinimumLatitude",
                "MaximumLatitude",
                "MinimumLongitude",
                "MaximumLongitude",
            ]
            .map(|name| mapping.find_keyword(name).and_then(|k| k.as_f64().ok()));
            if let [Some(lat0), Some(lat1), Some(lon0), Some(lon1)] = range {
                ground = Some(match ground {
                    Some([a, b, c, d]) => [a.min(lat0), b.max(lat1), c.min(lon0), d.max(lon1)],
                    None => [lat0, lat1, lon0, lon1],
                });
            }
            bands = bands.max(input.bands());
        }

        let mut mapping = reference.mapping();
        let corner = WorldMapper::new(resolution, min_x, max_y);
        corner.write_corner(&mut mapping);
        if let Some([lat0, lat1, lon0, lon1]) = ground {
            for (name, value) in [
                ("MinimumLatitude", lat0),
                ("MaximumLatitude", lat1),
                ("MinimumLongitude", lon0),
                ("MaximumLongitude", lon1),
            ] {
                mapping.set(Keyword::new(name, value).with_unit("degrees"));
            }
        }
        let samples = pixel_count(max_x - min_x, resolution);
        let lines = pixel_count(max_y - min_y, resolution);

        let mut cube = self.mosaic.create(samples, lines, bands, pixel_type)?;
        cube.put_group(mapping);
        info!(
            inputs = inputs.len(),
            samples,
            lines,
            bands,
            projection = reference.name(),
            "created map mosaic"
        );
        Ok(cube)
    }

    /// Place a map-projected cube into a map-projected mosaic. Returns
    /// false when no part of the input lands inside the mosaic.
    ///
    /// # Errors
    ///
    /// [`MosaicError::MappingMismatch`] when the projections differ, and
    /// any error of [`Mosaic::place`] other than no overlap.
    pub fn place(&self, input: &dyn RasterView, mosaic: &mut dyn RasterView) -> MosaicResult<bool> {
        let input_projection = self.factory.create_from_cube(input.label())?;
        let mut output_projection = self.factory.create_from_cube(mosaic.label())?;
        if projection_only(input_projection.mapping())
            != projection_only(output_projection.mapping())
        {
            return Err(MosaicError::MappingMismatch {
                input: input.file_name().to_string(),
                other: mosaic.file_name().to_string(),
            });
        }
        let input_mapper = world_mapper(&input_projection, input.file_name())?;
        let output_mapper = world_mapper(&output_projection, mosaic.file_name())?;

        let x = input_mapper.projection_x(1.0);
        let y = input_mapper.projection_y(1.0);
        let out_sample = (output_mapper.world_x(x) + 0.5).floor() as i64;
        let out_line = (output_mapper.world_y(y) + 0.5).floor() as i64;
        debug!(file = input.file_name(), out_sample, out_line, "map mosaic position");

        let mut placed = self.try_place(input, mosaic, out_sample, out_line)?;

        if let Some(width) = wrap_width(&mut output_projection) {
            let span = input.samples() as i64;
            let mut sample = out_sample;
            while sample + span - 1 >= 1 {
                sample -= width;
            }
            sample += width;
            while sample <= mosaic.samples() as i64 {
                if sample != out_sample {
                    debug!(file = input.file_name(), sample, width, "placing wrapped copy");
                    placed |= self.try_place(input, mosaic, sample, out_line)?;
                }
                sample += width;
            }
        }
        Ok(placed)
    }

    fn try_place(
        &self,
        input: &dyn RasterView,
        mosaic: &mut dyn RasterView,
        sample: i64,
        line: i64,
    ) -> MosaicResult<bool> {
        match self.mosaic.place(input, mosaic, sample, line, 1) {
            Ok(_) => Ok(true),
            Err(MosaicError::NoOverlap) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::Label;
    use cartos_core::pixel::is_null;

    fn equirectangular(upper_left_x: f64, upper_left_y: f64) -> Group {
        let mut g = Group::new("Mapping");
        g.set(Keyword::new("ProjectionName", "Equirectangular"));
        g.set(Keyword::new("EquatorialRadius", 180_000.0 / std::f64::consts::PI));
        g.set(Keyword::new("PolarRadius", 180_000.0 / std::f64::consts::PI));
        g.set(Keyword::new("LatitudeType", "Planetocentric"));
        g.set(Keyword::new("LongitudeDirection", "PositiveEast"));
        g.set(Keyword::new("LongitudeDomain", 360));
        g.set(Keyword::new("CenterLatitude", 0.0));
        g.set(Keyword::new("CenterLongitude", 0.0));
        g.set(Keyword::new("PixelResolution", 1000.0));
        g.set(Keyword::new("UpperLeftCornerX", upper_left_x));
        g.set(Keyword::new("UpperLeftCornerY", upper_left_y));
        g
    }

    fn projected(samples: usize, lines: usize, value: f64, mapping: Group, name: &str) -> Cube {
        Cube::new_with_value(samples, lines, 1, value)
            .unwrap()
            .with_name(name)
            .with_label(Label::from(mapping))
    }

    #[test]
    fn test_pixel_count() {
        assert_eq!(pixel_count(10_000.0, 1000.0), 10);
        assert_eq!(pixel_count(10_000.000_000_1, 1000.0), 10);
        assert_eq!(pixel_count(10_400.0, 1000.0), 11);
        assert_eq!(pixel_count(0.0, 1000.0), 1);
    }

    #[test]
    fn test_output_covers_inputs() {
        let a = projected(10, 10, 1.0, equirectangular(0.0, 10_000.0), "a.cub");
        let b = projected(10, 10, 2.0, equirectangular(5_000.0, 5_000.0), "b.cub");
        let engine = MapMosaic::default();
        let mut out = engine.create_output(&[&a, &b], PixelType::Real).unwrap();
        assert_eq!((out.samples(), out.lines()), (15, 15));
        let mapping = out.label().group("Mapping").unwrap();
        assert_eq!(mapping.f64("UpperLeftCornerX").unwrap(), 0.0);
        assert_eq!(mapping.f64("UpperLeftCornerY").unwrap(), 10_000.0);

        assert!(engine.place(&a, &mut out).unwrap());
        assert!(engine.place(&b, &mut out).unwrap());
        assert_eq!(out.read(1, 1, 1), 1.0);
        assert_eq!(out.read(6, 6, 1), 2.0);
        assert_eq!(out.read(15, 15, 1), 2.0);
        assert!(is_null(out.read(15, 1, 1)));
    }

    #[test]
    fn test_mismatched_projection() {
        let a = projected(2, 2, 1.0, equirectangular(0.0, 0.0), "a.cub");
        let mut other = equirectangular(0.0, 0.0);
        other.set(Keyword::new("CenterLongitude", 30.0));
        let b = projected(2, 2, 1.0, other, "b.cub");
        let err = MapMosaic::default()
            .create_output(&[&a, &b], PixelType::Real)
            .unwrap_err();
        assert!(matches!(err, MosaicError::MappingMismatch { .. }));
    }
}
