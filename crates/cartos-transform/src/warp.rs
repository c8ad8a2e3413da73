//! Top-level warp operations
//!
//! [`warp`] resamples a camera image into a map projection with the
//! strategy the camera calls for. [`cam2map`] and [`map2map`] build the
//! output mapping from a user's mapping group first, size the output raster
//! and then run the warp.

use crate::error::{TransformError, TransformResult};
use crate::options::{
    Cam2MapOptions, LonSeam, Map2MapOptions, RangeMode, ResolutionMode, SourceRange,
    SourceResolution, WarpAlgorithm, WarpOptions,
};
use crate::rubber_sheet::{PatchParameters, RubberSheet};
use crate::transform::{
    Cam2MapForward, Cam2MapReverse, Map2Map, RingsCam2MapForward, RingsCam2MapReverse,
};
use cartos_core::conventions::{to_planetocentric, to_planetographic};
use cartos_core::pixel::NULL;
use cartos_core::{
    AlphaCube, Camera, CameraType, Cube, Group, Keyword, Label, LatitudeType, LongitudeDirection,
    LongitudeDomain, RasterView, TilingHint,
};
use cartos_proj::{MapProjection, ProjectionFactory};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Framing cameras are smooth enough for small quads everywhere.
const FRAMING_TILING: TilingHint = TilingHint { start: 4, end: 4 };

/// An alpha line this close to 1 means the cube was not cropped in line.
const UNCROPPED_TOLERANCE: f64 = 1.0e-10;

/// Largest fractional alpha line still treated as a whole-line crop.
const FRACTIONAL_CROP_TOLERANCE: f64 = 1.0e-5;

/// Patch size used by a forced forward patch without a usable size.
const DEFAULT_FORWARD_PATCH: usize = 3;

const RANGE_KEYWORDS: [&str; 4] = [
    "MinimumLatitude",
    "MaximumLatitude",
    "MinimumLongitude",
    "MaximumLongitude",
];

const LATITUDE_KEYWORDS: [&str; 6] = [
    "MinimumLatitude",
    "MaximumLatitude",
    "CenterLatitude",
    "TrueScaleLatitude",
    "FirstStandardParallel",
    "SecondStandardParallel",
];

/// How the rubber sheet is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Output tiles, quad-tree subdivided, reverse transform
    ReverseTiled(TilingHint),
    /// Input patches, forward transform
    ForwardPatch(PatchParameters),
    /// Small output tiles sized from a patch size, reverse transform
    ReversePatch(TilingHint),
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ReverseTiled(t) => write!(f, "reverse tiled {}x{}", t.start, t.end),
            Strategy::ForwardPatch(p) => write!(
                f,
                "forward patch {}x{} step {}x{} from line {}",
                p.samples, p.lines, p.sample_increment, p.line_increment, p.start_line
            ),
            Strategy::ReversePatch(t) => write!(f, "reverse patch {}x{}", t.start, t.end),
        }
    }
}

/// Choose the resampling strategy for a camera.
///
/// | Camera | Strategy |
/// |---|---|
/// | framing | reverse, 4x4 tiles |
/// | line scan | forward patch, 5x5 step 4 |
/// | push frame | forward patch aligned to framelets |
/// | anything else | reverse, the camera's tiling hint |
///
/// A forced algorithm overrides the camera type; an explicit tiling
/// overrides the tile sizes of reverse strategies.
///
/// # Errors
///
/// - [`TransformError::FractionalCrop`] for a push-frame cube cropped part
///   way through a line
/// - [`TransformError::InvalidParameters`] for unusable tiling or framelet
///   geometry
pub fn select_strategy(
    camera: &dyn Camera,
    input_label: &Label,
    input_samples: usize,
    input_lines: usize,
    options: &WarpOptions,
) -> TransformResult<Strategy> {
    let tiling = options
        .tiling
        .map(|[start, end]| user_tiling(start, end))
        .transpose()?;
    let strategy = match options.algorithm {
        WarpAlgorithm::ForwardPatch => {
            let size = options
                .patch_size
                .filter(|&size| size > 1)
                .unwrap_or(DEFAULT_FORWARD_PATCH);
            Strategy::ForwardPatch(PatchParameters::new(1, 1, size, size, size - 1, size - 1)?)
        }
        WarpAlgorithm::ReversePatch => {
            let start = options.patch_size.unwrap_or(4).max(4).next_power_of_two();
            let hint = match tiling {
                Some(t) => t,
                None => TilingHint::new(start, (start / 2).min(4))?,
            };
            Strategy::ReversePatch(hint)
        }
        WarpAlgorithm::Automatic => match camera.camera_type() {
            CameraType::Framing => Strategy::ReverseTiled(tiling.unwrap_or(FRAMING_TILING)),
            CameraType::LineScan => Strategy::ForwardPatch(PatchParameters::default()),
            CameraType::PushFrame => Strategy::ForwardPatch(push_frame_patches(
                camera,
                input_label,
                input_samples,
                input_lines,
            )?),
            _ => Strategy::ReverseTiled(tiling.unwrap_or_else(|| camera.geometric_tiling_hint())),
        },
    };
    Ok(strategy)
}

/// Tile sizes forced through [`WarpOptions::tiling`]. Unlike a camera's
/// hint, the smallest tile may equal the largest, so `[4, 4]` never
/// subdivides. `[2, 2]` transforms every output pixel.
fn user_tiling(start: usize, end: usize) -> TransformResult<TilingHint> {
    if !start.is_power_of_two() || !end.is_power_of_two() || end < 2 || end > start {
        return Err(TransformError::InvalidParameters(format!(
            "tiling [{start}, {end}] must be powers of 2 with 2 <= end <= start"
        )));
    }
    Ok(TilingHint { start, end })
}

/// Patches one framelet tall on every other framelet, starting on a
/// framelet boundary of the original image.
fn push_frame_patches(
    camera: &dyn Camera,
    input_label: &Label,
    input_samples: usize,
    input_lines: usize,
) -> TransformResult<PatchParameters> {
    let geometry = camera.push_frame_geometry().ok_or_else(|| {
        TransformError::InvalidParameters("push-frame camera has no framelet geometry".into())
    })?;
    let frame_size = geometry.frame_size().round() as i64;
    if frame_size < 1 {
        return Err(TransformError::InvalidParameters(format!(
            "framelet height [{}] is less than one line",
            geometry.frame_size()
        )));
    }

    let mut start_line = 1;
    let alpha = AlphaCube::from_label(input_label, input_samples, input_lines)?;
    let alpha_line = alpha.alpha_line(1.0);
    if (alpha_line - 1.0).abs() > UNCROPPED_TOLERANCE {
        if (alpha_line - alpha_line.round()).abs() > FRACTIONAL_CROP_TOLERANCE {
            return Err(TransformError::FractionalCrop { alpha_line });
        }
        let offset = (alpha_line.round() as i64 - 1).rem_euclid(frame_size);
        start_line -= offset;
    }
    if geometry.even_framelets {
        start_line += frame_size;
    }
    let frame_size = frame_size as usize;
    PatchParameters::new(1, start_line, 5, frame_size, 4, 2 * frame_size)
}

/// Resample a camera image into a sized map projection.
///
/// Pixels the transform cannot reach are `NULL`. Returns the strategy used.
///
/// # Errors
///
/// Strategy selection failures and raster write failures.
pub fn warp(
    camera: &mut dyn Camera,
    projection: &mut MapProjection,
    input: &dyn RasterView,
    output: &mut dyn RasterView,
    options: &WarpOptions,
) -> TransformResult<Strategy> {
    let strategy = select_strategy(
        &*camera,
        input.label(),
        input.samples(),
        input.lines(),
        options,
    )?;
    debug!(%strategy, camera = ?camera.camera_type(), ring = projection.is_ring(), "warp");
    let (ons, onl) = (output.samples(), output.lines());
    let mut sheet = RubberSheet::new();

    match strategy {
        Strategy::ReverseTiled(tiling) | Strategy::ReversePatch(tiling) => {
            sheet.set_tiling(tiling);
            if let Some((sample, line)) = projected_centre(&mut *camera, projection, input) {
                sheet.force_tile(sample, line);
            }
            match projection {
                MapProjection::Planetary(p) => {
                    let mut transform =
                        Cam2MapReverse::new(camera, &mut **p, ons, onl).with_trim(options.trim);
                    if options.occlusion {
                        transform = transform.with_occlusion(options.occlusion_tolerance);
                    }
                    sheet.start_process(&mut transform, options.interpolation, input, output)?;
                }
                MapProjection::Ring(r) => {
                    let mut transform = RingsCam2MapReverse::new(camera, &mut **r, ons, onl)
                        .with_trim(options.trim);
                    sheet.start_process(&mut transform, options.interpolation, input, output)?;
                }
            }
        }
        Strategy::ForwardPatch(params) => {
            fill_null(output)?;
            sheet.set_patch_parameters(params);
            match projection {
                MapProjection::Planetary(p) => {
                    let mut transform =
                        Cam2MapForward::new(camera, &mut **p, ons, onl).with_trim(options.trim);
                    sheet.process_patch_transform(
                        &mut transform,
                        options.interpolation,
                        input,
                        output,
                    )?;
                }
                MapProjection::Ring(r) => {
                    let mut transform = RingsCam2MapForward::new(camera, &mut **r, ons, onl)
                        .with_trim(options.trim);
                    sheet.process_patch_transform(
                        &mut transform,
                        options.interpolation,
                        input,
                        output,
                    )?;
                }
            }
        }
    }
    Ok(strategy)
}

/// Output position of the centre of the input image.
fn projected_centre(
    camera: &mut dyn Camera,
    projection: &mut MapProjection,
    input: &dyn RasterView,
) -> Option<(f64, f64)> {
    let sample = (input.samples() / 2).max(1) as f64;
    let line = (input.lines() / 2).max(1) as f64;
    if !camera.set_image(sample, line) {
        return None;
    }
    match projection {
        MapProjection::Planetary(p) => p
            .set_universal_ground(camera.universal_latitude(), camera.universal_longitude())
            .then(|| (p.world_x(), p.world_y())),
        MapProjection::Ring(r) => {
            let radius = camera.ring_radius()?;
            r.set_universal_ground(radius, camera.universal_longitude())
                .then(|| (r.world_x(), r.world_y()))
        }
    }
}

fn fill_null(output: &mut dyn RasterView) -> TransformResult<()> {
    for band in 1..=output.bands() {
        for line in 1..=output.lines() {
            for sample in 1..=output.samples() {
                output.write(sample, line, band, NULL)?;
            }
        }
    }
    Ok(())
}

/// Copy of `group` named `Mapping`.
fn as_mapping(group: &Group) -> Group {
    let mut mapping = Group::new("Mapping");
    for keyword in group.keywords() {
        mapping.set(keyword.clone());
    }
    mapping
}

/// A convention keyword, or its default when absent.
fn convention<T>(group: &Group, name: &str) -> TransformResult<T>
where
    T: FromStr<Err = cartos_core::Error> + Default,
{
    match group.find_keyword(name) {
        Some(keyword) => Ok(keyword.text().parse()?),
        None => Ok(T::default()),
    }
}

fn set_domain(group: &mut Group, domain: LongitudeDomain) {
    group.set(Keyword::new("LongitudeDomain", domain.degrees()));
}

/// Output raster for a warp: size and bands from the sizing, pixel type
/// and crop bookkeeping from the input.
fn output_cube(
    input: &dyn RasterView,
    mut label: Label,
    samples: usize,
    lines: usize,
) -> TransformResult<Cube> {
    let alpha = AlphaCube::from_label(input.label(), input.samples(), input.lines())?;
    label.set_group(alpha.to_group());
    if let Some(band_bin) = input.label().find_group("BandBin") {
        label.set_group(band_bin.clone());
    }
    Ok(Cube::new(samples, lines, input.bands())?
        .with_name(input.file_name())
        .with_pixel_type(input.pixel_type())
        .with_label(label))
}

/// Project a camera image into the map described by `user_mapping`.
///
/// Keywords missing from `user_mapping` are taken from the camera's basic
/// mapping (a sinusoidal projection at the camera's finest resolution),
/// subject to the range and resolution modes in `options`. The returned
/// cube carries the canonical `Mapping` group, the input's `AlphaCube`
/// group and its `BandBin` group if it has one.
///
/// # Errors
///
/// - [`TransformError::LongitudeSeam`] when the image crosses the seam and
///   `lon_seam` is [`LonSeam::Error`]
/// - projection construction and sizing failures
/// - [`cartos_core::Error::CameraMissedTarget`] when no part of the image
///   intersects the target
pub fn cam2map(
    camera: &mut dyn Camera,
    input: &dyn RasterView,
    user_mapping: &Group,
    options: &Cam2MapOptions,
    factory: &ProjectionFactory,
) -> TransformResult<Cube> {
    let mut user = as_mapping(user_mapping);
    let mut camera_mapping = camera.basic_mapping()?;
    let range = camera.ground_range(&user)?;
    camera_mapping.set(Keyword::new("MinimumLatitude", range.min_lat));
    camera_mapping.set(Keyword::new("MaximumLatitude", range.max_lat));
    camera_mapping.set(Keyword::new("MinimumLongitude", range.min_lon));
    camera_mapping.set(Keyword::new("MaximumLongitude", range.max_lon));

    let source = match options.default_range {
        RangeMode::Map => &mut camera_mapping,
        RangeMode::Camera | RangeMode::Minimize => &mut user,
    };
    for name in RANGE_KEYWORDS {
        source.remove_keyword(name);
    }
    for (name, value) in options.range.keywords() {
        user.set(Keyword::new(name, value));
    }

    match options.resolution {
        ResolutionMode::Camera => {
            user.remove_keyword("Scale");
            user.remove_keyword("PixelResolution");
        }
        ResolutionMode::Map => {
            camera_mapping.remove_keyword("PixelResolution");
        }
        ResolutionMode::Mpp(mpp) => {
            camera_mapping.remove_keyword("PixelResolution");
            user.remove_keyword("Scale");
            user.set(Keyword::new("PixelResolution", mpp).with_unit("meters/pixel"));
        }
        ResolutionMode::Ppd(ppd) => {
            camera_mapping.remove_keyword("PixelResolution");
            user.remove_keyword("PixelResolution");
            user.set(Keyword::new("Scale", ppd).with_unit("pixels/degree"));
        }
    }

    for keyword in camera_mapping.keywords() {
        if !user.has_keyword(keyword.name()) {
            user.set(keyword.clone());
        }
    }

    if options.default_range != RangeMode::Map && camera.intersects_longitude_domain(&user)? {
        match options.lon_seam {
            LonSeam::Auto => {
                let domain: LongitudeDomain = convention(&user, "LongitudeDomain")?;
                set_domain(&mut user, domain.swapped());
                if camera.intersects_longitude_domain(&user)? {
                    // Global coverage; no domain avoids the seam
                    set_domain(&mut user, domain);
                } else {
                    debug!(
                        file = input.file_name(),
                        domain = domain.swapped().degrees(),
                        "switched longitude domain to avoid the seam"
                    );
                    if !options.range.has_longitudes() {
                        let range = camera.ground_range(&user)?;
                        user.set(Keyword::new("MinimumLongitude", range.min_lon));
                        user.set(Keyword::new("MaximumLongitude", range.max_lon));
                    }
                }
            }
            LonSeam::Error => {
                return Err(TransformError::LongitudeSeam {
                    file: input.file_name().to_string(),
                });
            }
            LonSeam::Continue => {}
        }
    }

    let mut label = Label::from(user);
    let (sized, trim) = match options.default_range {
        RangeMode::Minimize => (factory.create_for_cube_with_camera(&mut label, camera)?, false),
        RangeMode::Camera | RangeMode::Map => {
            (factory.create_for_cube(&mut label)?, options.warp.trim)
        }
    };
    let (samples, lines) = (sized.samples, sized.lines);
    let mut projection = sized.projection;
    let mut output = output_cube(input, label, samples, lines)?;

    let warp_options = WarpOptions {
        trim,
        ..options.warp.clone()
    };
    let strategy = warp(camera, &mut projection, input, &mut output, &warp_options)?;
    info!(
        file = input.file_name(),
        projection = projection.name(),
        samples,
        lines,
        %strategy,
        "cam2map"
    );
    Ok(output)
}

/// Reproject a map-projected cube into the map described by
/// `user_mapping`.
///
/// The output mapping starts from the input's; keywords in `user_mapping`
/// replace it. Longitude and latitude keywords inherited from the input are
/// converted to the output's direction, domain and latitude type.
///
/// # Errors
///
/// - [`TransformError::UnorderedLongitudes`] when the converted range has
///   its minimum longitude at or past its maximum
/// - label, projection construction and sizing failures
pub fn map2map(
    input: &dyn RasterView,
    user_mapping: &Group,
    options: &Map2MapOptions,
    factory: &ProjectionFactory,
) -> TransformResult<Cube> {
    let from = input.label().mapping()?;
    let mut user = as_mapping(user_mapping);
    let mut out = from.clone();

    if options.default_range == SourceRange::From {
        for name in RANGE_KEYWORDS {
            user.remove_keyword(name);
        }
    }
    for (name, value) in options.range.keywords() {
        user.set(Keyword::new(name, value));
    }

    match options.resolution {
        SourceResolution::From => {
            user.remove_keyword("Scale");
            user.remove_keyword("PixelResolution");
        }
        SourceResolution::Map => {
            out.remove_keyword("Scale");
            out.remove_keyword("PixelResolution");
        }
        SourceResolution::Mpp(mpp) => {
            out.remove_keyword("Scale");
            user.remove_keyword("Scale");
            user.set(Keyword::new("PixelResolution", mpp).with_unit("meters/pixel"));
        }
        SourceResolution::Ppd(ppd) => {
            out.remove_keyword("PixelResolution");
            user.remove_keyword("PixelResolution");
            user.set(Keyword::new("Scale", ppd).with_unit("pixels/degree"));
        }
    }

    for name in ["Rotation", "UpperLeftCornerX", "UpperLeftCornerY"] {
        out.remove_keyword(name);
    }
    for keyword in user.keywords() {
        out.set(keyword.clone());
    }
    convert_longitudes(&from, &user, &mut out)?;
    convert_latitudes(&from, &user, &mut out)?;

    if out.has_keyword("MinimumLongitude") && out.has_keyword("MaximumLongitude") {
        let min_lon = out.f64("MinimumLongitude")?;
        let max_lon = out.f64("MaximumLongitude")?;
        if min_lon >= max_lon {
            return Err(TransformError::UnorderedLongitudes);
        }
    }

    let mut label = Label::from(out);
    let sized = factory.create_for_cube(&mut label)?;
    let (samples, lines) = (sized.samples, sized.lines);
    let mut output_projection = sized.projection.into_planetary()?;
    let mut input_projection = factory.create_from_cube(input.label())?.into_planetary()?;
    let mut output = output_cube(input, label, samples, lines)?;

    let mut transform = Map2Map::new(
        &mut *input_projection,
        input.samples(),
        input.lines(),
        &mut *output_projection,
        samples,
        lines,
    )
    .with_trim(options.trim);
    RubberSheet::new().start_process(&mut transform, options.interpolation, input, &mut output)?;
    info!(
        file = input.file_name(),
        samples,
        lines,
        wrap = transform.input_world_size(),
        "map2map"
    );
    Ok(output)
}

/// Convert the longitude keywords `out` inherited from `from` to `out`'s
/// direction and domain. Spans are preserved, so a range that wraps in one
/// domain stays contiguous in the other.
fn convert_longitudes(from: &Group, user: &Group, out: &mut Group) -> TransformResult<()> {
    let from_direction: LongitudeDirection = convention(from, "LongitudeDirection")?;
    let out_direction: LongitudeDirection = convention(out, "LongitudeDirection")?;
    let from_domain: LongitudeDomain = convention(from, "LongitudeDomain")?;
    let out_domain: LongitudeDomain = convention(out, "LongitudeDomain")?;
    if from_direction == out_direction && from_domain == out_domain {
        return Ok(());
    }
    let flip = from_direction != out_direction;
    let inherited = |name: &str, out: &Group| !user.has_keyword(name) && out.has_keyword(name);

    if inherited("CenterLongitude", out) {
        let center = out.f64("CenterLongitude")?;
        let center = out_domain.wrap(if flip { -center } else { center });
        out.set(Keyword::new("CenterLongitude", center).with_unit("degrees"));
    }

    let min_inherited = inherited("MinimumLongitude", out);
    let max_inherited = inherited("MaximumLongitude", out);
    if min_inherited && max_inherited {
        let (mut min, mut max) = (out.f64("MinimumLongitude")?, out.f64("MaximumLongitude")?);
        if flip {
            (min, max) = (-max, -min);
        }
        let span = max - min;
        let (min, max) = if span >= 360.0 {
            let low = match out_domain {
                LongitudeDomain::Domain180 => -180.0,
                LongitudeDomain::Domain360 => 0.0,
            };
            (low, low + 360.0)
        } else {
            let min = out_domain.wrap(min);
            (min, min + span)
        };
        out.set(Keyword::new("MinimumLongitude", min));
        out.set(Keyword::new("MaximumLongitude", max));
    } else {
        for (name, present) in [
            ("MinimumLongitude", min_inherited),
            ("MaximumLongitude", max_inherited),
        ] {
            if present {
                let lon = out.f64(name)?;
                out.set(Keyword::new(name, out_domain.wrap(if flip { -lon } else { lon })));
            }
        }
    }
    Ok(())
}

/// Convert the latitude keywords `out` inherited from `from` to `out`'s
/// latitude type, on `from`'s radii.
fn convert_latitudes(from: &Group, user: &Group, out: &mut Group) -> TransformResult<()> {
    let from_type: LatitudeType = convention(from, "LatitudeType")?;
    let out_type: LatitudeType = convention(out, "LatitudeType")?;
    if from_type == out_type {
        return Ok(());
    }
    let a = from.f64("EquatorialRadius")?;
    let c = from.f64("PolarRadius")?;
    for name in LATITUDE_KEYWORDS {
        if user.has_keyword(name) || !out.has_keyword(name) {
            continue;
        }
        let lat = out.f64(name)?;
        let converted = match out_type {
            LatitudeType::Planetographic => to_planetographic(lat, a, c)?,
            LatitudeType::Planetocentric => to_planetocentric(lat, a, c)?,
        };
        out.set(Keyword::new(name, converted));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::PushFrameGeometry;
    use cartos_test::LinearCamera;

    fn push_frame(framelet_height: usize, even: bool) -> LinearCamera {
        LinearCamera::north_up(10, 40, 10.0, 0.0).with_push_frame(PushFrameGeometry {
            framelet_height,
            line_scale_factor: 1.0,
            even_framelets: even,
        })
    }

    fn cropped_label(alpha_start_line: f64) -> Label {
        let alpha = AlphaCube::new(10, 100, 10, 40, 0.5, alpha_start_line, 10.5, alpha_start_line + 40.0);
        let mut label = Label::new();
        label.set_group(alpha.to_group());
        label
    }

    fn select(camera: &dyn Camera, label: &Label, options: &WarpOptions) -> Strategy {
        select_strategy(camera, label, 10, 40, options).unwrap()
    }

    #[test]
    fn test_strategy_by_camera_type() {
        let options = WarpOptions::default();
        let label = Label::new();
        let framing = LinearCamera::north_up(10, 10, 0.0, 0.0);
        assert_eq!(select(&framing, &label, &options), Strategy::ReverseTiled(FRAMING_TILING));

        let line_scan = LinearCamera::north_up(10, 10, 0.0, 0.0).with_camera_type(CameraType::LineScan);
        assert_eq!(
            select(&line_scan, &label, &options),
            Strategy::ForwardPatch(PatchParameters::default())
        );

        let radar = LinearCamera::north_up(10, 10, 0.0, 0.0)
            .with_camera_type(CameraType::Radar)
            .with_tiling(TilingHint::new(64, 4).unwrap());
        assert_eq!(
            select(&radar, &label, &options),
            Strategy::ReverseTiled(TilingHint::new(64, 4).unwrap())
        );
    }

    #[test]
    fn test_forced_strategies() {
        let camera = LinearCamera::north_up(10, 10, 0.0, 0.0);
        let label = Label::new();
        let forward = WarpOptions {
            algorithm: WarpAlgorithm::ForwardPatch,
            patch_size: Some(1),
            ..WarpOptions::default()
        };
        assert_eq!(
            select(&camera, &label, &forward),
            Strategy::ForwardPatch(PatchParameters::new(1, 1, 3, 3, 2, 2).unwrap())
        );

        let reverse = WarpOptions {
            algorithm: WarpAlgorithm::ReversePatch,
            patch_size: Some(5),
            ..WarpOptions::default()
        };
        assert_eq!(
            select(&camera, &label, &reverse),
            Strategy::ReversePatch(TilingHint::new(8, 4).unwrap())
        );

        let bad_tiling = WarpOptions {
            tiling: Some([6, 2]),
            ..WarpOptions::default()
        };
        assert!(select_strategy(&camera, &label, 10, 10, &bad_tiling).is_err());
    }

    #[test]
    fn test_forced_tiling_may_be_square() {
        let camera = LinearCamera::north_up(10, 10, 0.0, 0.0);
        let label = Label::new();
        let tiling = |sizes| WarpOptions {
            tiling: Some(sizes),
            ..WarpOptions::default()
        };
        assert_eq!(
            select(&camera, &label, &tiling([4, 4])),
            Strategy::ReverseTiled(TilingHint { start: 4, end: 4 })
        );
        assert_eq!(
            select(&camera, &label, &tiling([2, 2])),
            Strategy::ReverseTiled(TilingHint { start: 2, end: 2 })
        );
        for bad in [[4, 8], [4, 1], [4, 3]] {
            let err = select_strategy(&camera, &label, 10, 10, &tiling(bad)).unwrap_err();
            assert!(matches!(err, TransformError::InvalidParameters(_)));
        }
    }

    #[test]
    fn test_push_frame_alignment() {
        let options = WarpOptions::default();
        let uncropped = select(&push_frame(8, false), &Label::new(), &options);
        assert_eq!(
            uncropped,
            Strategy::ForwardPatch(PatchParameters::new(1, 1, 5, 8, 4, 16).unwrap())
        );

        // First line is alpha line 12: 11 lines into the crop, 3 past a
        // framelet boundary
        let cropped = select(&push_frame(8, false), &cropped_label(11.5), &options);
        assert_eq!(
            cropped,
            Strategy::ForwardPatch(PatchParameters::new(1, -2, 5, 8, 4, 16).unwrap())
        );

        let even = select(&push_frame(8, true), &cropped_label(11.5), &options);
        assert_eq!(
            even,
            Strategy::ForwardPatch(PatchParameters::new(1, 6, 5, 8, 4, 16).unwrap())
        );
    }

    #[test]
    fn test_fractional_push_frame_crop_rejected() {
        let err = select_strategy(
            &push_frame(8, false),
            &cropped_label(11.75),
            10,
            40,
            &WarpOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::FractionalCrop { .. }));
        assert_eq!(err.kind(), cartos_core::ErrorKind::User);
    }

    #[test]
    fn test_longitudes_follow_direction_and_domain() {
        let mut from = Group::new("Mapping");
        from.set(Keyword::new("LongitudeDirection", "PositiveEast"));
        from.set(Keyword::new("LongitudeDomain", 360));
        from.set(Keyword::new("MinimumLongitude", 350.0));
        from.set(Keyword::new("MaximumLongitude", 370.0));
        from.set(Keyword::new("CenterLongitude", 355.0));
        let mut user = Group::new("Mapping");
        user.set(Keyword::new("LongitudeDirection", "PositiveWest"));
        user.set(Keyword::new("LongitudeDomain", 180));

        let mut out = from.clone();
        for k in user.keywords() {
            out.set(k.clone());
        }
        convert_longitudes(&from, &user, &mut out).unwrap();
        assert_eq!(out.f64("MinimumLongitude").unwrap(), -10.0);
        assert_eq!(out.f64("MaximumLongitude").unwrap(), 10.0);
        assert_eq!(out.f64("CenterLongitude").unwrap(), 5.0);
    }

    #[test]
    fn test_full_turn_keeps_its_span() {
        let mut from = Group::new("Mapping");
        from.set(Keyword::new("MinimumLongitude", 0.0));
        from.set(Keyword::new("MaximumLongitude", 360.0));
        let mut user = Group::new("Mapping");
        user.set(Keyword::new("LongitudeDomain", 180));
        let mut out = from.clone();
        out.set(Keyword::new("LongitudeDomain", 180));
        convert_longitudes(&from, &user, &mut out).unwrap();
        assert_eq!(out.f64("MinimumLongitude").unwrap(), -180.0);
        assert_eq!(out.f64("MaximumLongitude").unwrap(), 180.0);
    }
}
