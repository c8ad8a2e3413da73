//! Label-driven projection construction and output sizing
//!
//! [`ProjectionFactory`] resolves `ProjectionName` through a
//! [`ProjectionRegistry`] and, for the `create_for_cube*` family, works out
//! the raster that covers a ground range: pixel resolution, upper-left
//! corner and size. The sized mapping group is written back into the label
//! in canonical form, so sizing the same label twice gives the same label.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::XYRange;
use crate::registry::{Constructor, MapProjection, ProjectionRegistry};
use crate::ring::RingDirection;
use crate::world::WorldMapper;
use cartos_core::{Camera, Error, Group, Keyword, Label, LongitudeDomain};
use std::f64::consts::PI;
use tracing::{debug, info};

/// Remainders of the corner snap smaller than this count as on a pixel edge.
const SNAP_TOLERANCE: f64 = 1.0e-6;

const GROUND_RANGE_KEYWORDS: [&str; 4] = [
    "MinimumLatitude",
    "MaximumLatitude",
    "MinimumLongitude",
    "MaximumLongitude",
];

const RING_RANGE_KEYWORDS: [&str; 4] = [
    "MinimumRingRadius",
    "MaximumRingRadius",
    "MinimumRingLongitude",
    "MaximumRingLongitude",
];

/// A projection sized for an output raster.
#[derive(Debug)]
pub struct SizedProjection {
    pub projection: MapProjection,
    pub samples: usize,
    pub lines: usize,
}

/// Builds projections from labels.
#[derive(Clone)]
pub struct ProjectionFactory {
    registry: ProjectionRegistry,
}

impl Default for ProjectionFactory {
    fn default() -> Self {
        Self::new(ProjectionRegistry::builtin())
    }
}

impl ProjectionFactory {
    pub fn new(registry: ProjectionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProjectionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProjectionRegistry {
        &mut self.registry
    }

    fn constructor_for(&self, label: &Label) -> ProjectionResult<Constructor> {
        let name = label.group("Mapping")?.text("ProjectionName")?;
        self.registry.lookup(&name)
    }

    /// Construct the projection named by the label's `Mapping` group.
    ///
    /// # Errors
    ///
    /// [`ProjectionError::Unsupported`] for an unregistered name, otherwise
    /// whatever the projection's constructor reports.
    pub fn create(&self, label: &Label, allow_defaults: bool) -> ProjectionResult<MapProjection> {
        let projection = self.constructor_for(label)?.build(label, allow_defaults)?;
        debug!(projection = projection.name(), "created projection");
        Ok(projection)
    }

    /// Construct a projection and size a raster covering its ground range.
    ///
    /// The label's `Mapping` group is replaced by the canonical group with
    /// `PixelResolution`, `Scale` and `UpperLeftCornerX/Y` filled in.
    ///
    /// # Errors
    ///
    /// Fails when the mapping has neither `PixelResolution` nor `Scale`, or
    /// when it has no usable ground range.
    pub fn create_for_cube(&self, label: &mut Label) -> ProjectionResult<SizedProjection> {
        let mut projection = self.create(label, true)?;
        let resolution = resolve_resolution(&mut projection)?;
        if !projection.has_ground_range() {
            return Err(ProjectionError::InvalidGroundRange(
                "missing from [Mapping]".to_string(),
            ));
        }
        let xy = projection.xy_range().ok_or_else(|| {
            ProjectionError::InvalidGroundRange("no part of the range projects".to_string())
        })?;
        Ok(finish(label, projection, resolution, xy))
    }

    /// Like [`create_for_cube`](Self::create_for_cube), but the raster covers
    /// what the camera sees rather than the ground range.
    ///
    /// Missing ground range keywords are first filled from the camera. Every
    /// edge pixel of the image (of every band, for band dependent cameras)
    /// is projected; poles visible in the image are included.
    pub fn create_for_cube_with_camera(
        &self,
        label: &mut Label,
        camera: &mut dyn Camera,
    ) -> ProjectionResult<SizedProjection> {
        match self.constructor_for(label)? {
            Constructor::Planetary(_) => fill_ground_range(label, camera)?,
            Constructor::Ring(_) => fill_ring_range(label, camera)?,
        }
        let mut projection = self.create(label, true)?;
        let resolution = resolve_resolution(&mut projection)?;
        let xy = camera_extent(camera, &mut projection).ok_or(Error::CameraMissedTarget)?;
        Ok(finish(label, projection, resolution, xy))
    }

    /// Rebuild the projection of an already map-projected cube.
    ///
    /// The world mapper comes from `PixelResolution` (or `Scale`) and
    /// `UpperLeftCornerX/Y`; nothing is resized.
    pub fn create_from_cube(&self, label: &Label) -> ProjectionResult<MapProjection> {
        let mut projection = self.create(label, true)?;
        let resolution = resolve_resolution(&mut projection)?;
        let mapping = projection.mapping_group();
        let upper_left_x = mapping.f64("UpperLeftCornerX")?;
        let upper_left_y = mapping.f64("UpperLeftCornerY")?;
        projection.set_world_mapper(WorldMapper::new(resolution, upper_left_x, upper_left_y));
        Ok(projection)
    }
}

/// Resolution in metres per pixel, preferring `PixelResolution` over
/// `Scale`. Both keywords are rewritten so they agree.
fn resolve_resolution(projection: &mut MapProjection) -> ProjectionResult<f64> {
    let radius = projection.true_scale_radius();
    let mapping = projection.mapping_group();
    let resolution = if let Some(k) = mapping.find_keyword("PixelResolution") {
        k.as_f64()?
    } else if let Some(k) = mapping.find_keyword("Scale") {
        let scale = k.as_f64()?;
        if scale <= 0.0 {
            return Err(ProjectionError::mapping(format!(
                "[Scale] of [{scale}] must be greater than zero"
            )));
        }
        2.0 * PI * radius / (360.0 * scale)
    } else {
        return Err(ProjectionError::mapping(
            "must have either [PixelResolution] or [Scale]",
        ));
    };
    if !(resolution > 0.0 && resolution.is_finite()) {
        return Err(ProjectionError::mapping(format!(
            "[PixelResolution] of [{resolution}] must be greater than zero"
        )));
    }
    let scale = 2.0 * PI * radius / (360.0 * resolution);
    let mapping = projection.mapping_group_mut();
    mapping.set(Keyword::new("PixelResolution", resolution).with_unit("meters/pixel"));
    mapping.set(Keyword::new("Scale", scale).with_unit("pixels/degree"));
    Ok(resolution)
}

/// Snap the upper-left corner outward to whole pixels and size the raster.
/// Degenerate extents still get one pixel.
fn snap(xy: XYRange, resolution: f64) -> (f64, f64, usize, usize) {
    let mut min_x = xy.min_x;
    let mut max_y = xy.max_y;
    let rem = (min_x % resolution).abs();
    if rem > SNAP_TOLERANCE && resolution - rem > SNAP_TOLERANCE {
        min_x = (min_x / resolution).floor() * resolution;
    }
    let rem = (max_y % resolution).abs();
    if rem > SNAP_TOLERANCE && resolution - rem > SNAP_TOLERANCE {
        max_y = (max_y / resolution).ceil() * resolution;
    }
    let samples = ((xy.max_x - min_x) / resolution + 0.5) as usize;
    let lines = ((max_y - xy.min_y) / resolution + 0.5) as usize;
    (min_x, max_y, samples.max(1), lines.max(1))
}

fn finish(
    label: &mut Label,
    mut projection: MapProjection,
    resolution: f64,
    xy: XYRange,
) -> SizedProjection {
    let (upper_left_x, upper_left_y, samples, lines) = snap(xy, resolution);
    let mapper = WorldMapper::new(resolution, upper_left_x, upper_left_y);
    mapper.write_corner(projection.mapping_group_mut());
    projection.set_world_mapper(mapper);
    label.set_group(projection.mapping());
    info!(
        projection = projection.name(),
        samples,
        lines,
        resolution,
        upper_left_x,
        upper_left_y,
        "sized projection for cube"
    );
    SizedProjection {
        projection,
        samples,
        lines,
    }
}

fn fill_ground_range(label: &mut Label, camera: &mut dyn Camera) -> ProjectionResult<()> {
    let mapping = label.group_mut("Mapping")?;
    if GROUND_RANGE_KEYWORDS.iter().all(|k| mapping.has_keyword(k)) {
        return Ok(());
    }
    let range = camera.ground_range(mapping)?;
    let values = [range.min_lat, range.max_lat, range.min_lon, range.max_lon];
    for (name, value) in GROUND_RANGE_KEYWORDS.iter().zip(values) {
        if !mapping.has_keyword(name) {
            mapping.set(Keyword::new(*name, value));
        }
    }
    debug!(?range, "ground range filled from camera");
    Ok(())
}

fn fill_ring_range(label: &mut Label, camera: &mut dyn Camera) -> ProjectionResult<()> {
    let mapping = label.group_mut("Mapping")?;
    if RING_RANGE_KEYWORDS.iter().all(|k| mapping.has_keyword(k)) {
        return Ok(());
    }
    let direction: RingDirection = text_or(mapping, "RingLongitudeDirection", "CounterClockwise")?;
    let domain: LongitudeDomain = text_or(mapping, "RingLongitudeDomain", "360")?;

    let mut range = XYRange::empty();
    let (ns, nl) = (camera.samples(), camera.lines());
    for line in 0..=nl {
        for samp in 0..=ns {
            let edge = line == 0 || line == nl || samp == 0 || samp == ns;
            if !edge || !camera.set_image(samp as f64 + 0.5, line as f64 + 0.5) {
                continue;
            }
            if let Some(radius) = camera.ring_radius() {
                let ccw = camera.universal_longitude();
                let lon = match direction {
                    RingDirection::Clockwise => domain.wrap(-ccw),
                    RingDirection::CounterClockwise => domain.wrap(ccw),
                };
                // x holds radius, y holds longitude
                range.include(radius, lon);
            }
        }
    }
    if !range.is_valid() {
        return Err(Error::CameraMissedTarget.into());
    }
    let values = [range.min_x, range.max_x, range.min_y, range.max_y];
    for (name, value) in RING_RANGE_KEYWORDS.iter().zip(values) {
        if !mapping.has_keyword(name) {
            mapping.set(Keyword::new(*name, value));
        }
    }
    Ok(())
}

fn text_or<T>(mapping: &Group, name: &str, default: &str) -> ProjectionResult<T>
where
    T: std::str::FromStr<Err = Error>,
{
    let text = match mapping.find_keyword(name) {
        Some(k) => k.text(),
        None => default.to_string(),
    };
    Ok(text.parse()?)
}

/// Projection coordinates of the camera's current intersection.
fn project_intersection(
    camera: &dyn Camera,
    projection: &mut MapProjection,
) -> Option<(f64, f64)> {
    match projection {
        MapProjection::Planetary(p) => p
            .set_universal_ground(camera.universal_latitude(), camera.universal_longitude())
            .then(|| (p.x_coord(), p.y_coord())),
        MapProjection::Ring(p) => {
            let radius = camera.ring_radius()?;
            p.set_universal_ground(radius, camera.universal_longitude())
                .then(|| (p.x_coord(), p.y_coord()))
        }
    }
}

/// Projection extent of the image edges. Interior rows contribute their
/// first and last intersecting sample only.
fn camera_extent(camera: &mut dyn Camera, projection: &mut MapProjection) -> Option<XYRange> {
    let mut xy = XYRange::empty();
    let (ns, nl) = (camera.samples(), camera.lines());
    let original_band = camera.band();
    let bands = if camera.is_band_independent() {
        1
    } else {
        camera.bands()
    };

    for band in 1..=bands {
        camera.set_band(band);
        for line in 0..=nl {
            let y = line as f64 + 0.5;
            let edge_row = line == 0 || line == nl;
            let mut first_hit = None;
            for samp in 0..=ns {
                if camera.set_image(samp as f64 + 0.5, y) {
                    if let Some((px, py)) = project_intersection(camera, projection) {
                        xy.include(px, py);
                    }
                    if !edge_row {
                        first_hit = Some(samp);
                        break;
                    }
                }
            }
            let Some(first) = first_hit else { continue };
            for samp in (first + 1..=ns).rev() {
                if camera.set_image(samp as f64 + 0.5, y) {
                    if let Some((px, py)) = project_intersection(camera, projection) {
                        xy.include(px, py);
                    }
                    break;
                }
            }
        }

        if let MapProjection::Planetary(p) = projection {
            for pole in [90.0, -90.0] {
                if camera.set_universal_ground(pole, 0.0)
                    && camera.in_image()
                    && p.set_universal_ground(pole, 0.0)
                {
                    xy.include(p.x_coord(), p.y_coord());
                }
            }
        }
    }
    camera.set_band(original_band);
    xy.is_valid().then_some(xy)
}
