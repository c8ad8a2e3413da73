//! Warp regression test
//!
//! Camera to map and map to map warps end to end: the reverse tiled
//! engine against an independently computed expectation, forward patches,
//! band dependent cameras, ring-plane projections, longitude seam handling
//! and push-frame crop checks.

use cartos_core::conventions::to_180_domain;
use cartos_core::pixel::{NULL, is_null};
use cartos_core::{
    AlphaCube, CameraType, Cube, Group, Keyword, Label, LongitudeDirection, LongitudeDomain,
    PushFrameGeometry, RasterView,
};
use cartos_proj::ProjectionFactory;
use cartos_test::{
    LinearCamera, RegParams, RingCamera, TEST_RADIUS, TEST_TARGET, equirectangular_mapping,
    mapping_label, ramp_cube, sinusoidal_mapping, with_ground_range,
};
use cartos_transform::{
    Cam2MapOptions, Interpolator, LonSeam, Map2MapOptions, RangeMode, ResolutionMode, Strategy,
    TransformError, WarpAlgorithm, WarpOptions, cam2map, map2map, warp,
};

fn nearest_options(range: RangeMode, resolution: ResolutionMode) -> Cam2MapOptions {
    Cam2MapOptions {
        warp: WarpOptions {
            interpolation: Interpolator::NearestNeighbor,
            ..WarpOptions::default()
        },
        default_range: range,
        resolution,
        ..Cam2MapOptions::default()
    }
}

/// Camera with `(lat, lon) = (sample - 1, line - 1)`.
fn diagonal_camera() -> LinearCamera {
    LinearCamera::affine(10, 10, 0.0, 0.0, [1.0, 0.0], [0.0, 1.0])
}

/// North-up camera whose pixel centres sit on half degrees, covering
/// latitudes 0 to 10 and longitudes 10 to 20.
fn aligned_camera() -> LinearCamera {
    LinearCamera::north_up(10, 10, 9.5, 10.5)
}

fn aligned_mapping() -> Group {
    with_ground_range(equirectangular_mapping(0.0, 0.0, 1000.0), 0.0, 10.0, 10.0, 20.0)
}

fn count_mismatches(expected: &dyn RasterView, actual: &dyn RasterView, band: usize) -> usize {
    let mut mismatches = 0;
    for l in 1..=expected.lines() as i64 {
        for s in 1..=expected.samples() as i64 {
            if expected.read(s, l, band) != actual.read(s, l, band) {
                mismatches += 1;
            }
        }
    }
    mismatches
}

#[test]
fn warp_reg() {
    let mut rp = RegParams::new("warp");
    let factory = ProjectionFactory::default();

    // --- Test 1: framing camera into sinusoidal, reverse tiled ---
    let input = ramp_cube(10, 10, 1).unwrap();
    let options = nearest_options(RangeMode::Camera, ResolutionMode::Map);
    let mut camera = diagonal_camera();
    let output = cam2map(
        &mut camera,
        &input,
        &sinusoidal_mapping(0.0, 1000.0),
        &options,
        &factory,
    )
    .expect("cam2map");
    let mapping = output.label().mapping().unwrap();
    let domain: LongitudeDomain = mapping.text("LongitudeDomain").unwrap().parse().unwrap();
    rp.check(
        domain == LongitudeDomain::Domain180,
        "image on the 0 meridian moves to the 180 domain",
    );
    rp.check(output.label().has_group("AlphaCube"), "alpha cube group added");

    let mut projection = factory
        .create_from_cube(output.label())
        .unwrap()
        .into_planetary()
        .unwrap();
    let (mut checked, mut nulls, mut mismatches) = (0, 0, 0);
    for l in 1..=output.lines() {
        for s in 1..=output.samples() {
            let actual = output.read(s as i64, l as i64, 1);
            if !projection.set_world(s as f64, l as f64) {
                continue;
            }
            let is = projection.universal_latitude() + 1.0;
            let il = to_180_domain(projection.universal_longitude()) + 1.0;
            let near_half = |v: f64| (v.rem_euclid(1.0) - 0.5).abs() < 0.02;
            if near_half(is) || near_half(il) {
                continue;
            }
            let inside = (0.5..=10.5).contains(&is) && (0.5..=10.5).contains(&il);
            let expected = if inside {
                input.read((is + 0.5).floor() as i64, (il + 0.5).floor() as i64, 1)
            } else {
                nulls += 1;
                NULL
            };
            checked += 1;
            if expected != actual {
                mismatches += 1;
            }
        }
    }
    eprintln!("  checked {checked} pixels, {nulls} outside the image");
    rp.compare_values(0.0, mismatches as f64, 0.0);
    rp.check(checked > 50, "enough pixels compared");
    rp.check(nulls > 0, "border pixels outside the image are null");

    // --- Test 2: the reverse warp is deterministic ---
    let mut camera = diagonal_camera();
    let again = cam2map(
        &mut camera,
        &input,
        &sinusoidal_mapping(0.0, 1000.0),
        &options,
        &factory,
    )
    .expect("second cam2map");
    rp.check(again.data() == output.data(), "bit-identical rerun");

    // --- Test 3: forward patch and reverse tiles agree on an aligned grid ---
    let options = nearest_options(RangeMode::Map, ResolutionMode::Map);
    let mut framing = aligned_camera();
    let reverse = cam2map(&mut framing, &input, &aligned_mapping(), &options, &factory)
        .expect("framing cam2map");
    let mut line_scan = aligned_camera().with_camera_type(CameraType::LineScan);
    let forward = cam2map(&mut line_scan, &input, &aligned_mapping(), &options, &factory)
        .expect("line scan cam2map");
    rp.compare_values(10.0, reverse.samples() as f64, 0.0);
    rp.compare_values(10.0, reverse.lines() as f64, 0.0);
    rp.compare_values(0.0, count_mismatches(&input, &reverse, 1) as f64, 0.0);
    rp.compare_values(0.0, count_mismatches(&input, &forward, 1) as f64, 0.0);

    // --- Test 4: band dependent camera is re-walked per band ---
    let input2 = ramp_cube(10, 10, 2).unwrap();
    let mut shifted = aligned_camera().with_bands(2).with_band_shift(1.0);
    let output = cam2map(&mut shifted, &input2, &aligned_mapping(), &options, &factory)
        .expect("band dependent cam2map");
    rp.compare_values(0.0, count_mismatches(&input2, &output, 1) as f64, 0.0);
    rp.compare_values(input2.read(4, 6, 2), output.read(5, 6, 2), 0.0);
    rp.check(is_null(output.read(1, 6, 2)), "band 2 starts one pixel late");

    // --- Test 5: longitude seam modes ---
    let mut camera = diagonal_camera();
    let seam_error = Cam2MapOptions {
        lon_seam: LonSeam::Error,
        ..nearest_options(RangeMode::Camera, ResolutionMode::Map)
    };
    let input = ramp_cube(10, 10, 1).unwrap().with_name("seam.cub");
    let err = cam2map(
        &mut camera,
        &input,
        &sinusoidal_mapping(0.0, 1000.0),
        &seam_error,
        &factory,
    )
    .err()
    .expect("seam error");
    rp.check(
        matches!(err, TransformError::LongitudeSeam { .. }),
        "LonSeam::Error fails",
    );
    rp.compare_strings(
        b"The image [seam.cub] crosses the longitude seam",
        err.to_string().as_bytes(),
    );

    // --- Test 6: push-frame cube cropped at a fractional line ---
    let alpha = AlphaCube::new(10, 100, 10, 10, 0.5, 3.7, 10.5, 13.7);
    let mut label = Label::new();
    label.set_group(alpha.to_group());
    let cropped = ramp_cube(10, 10, 1).unwrap().with_label(label);
    let mut push_frame = aligned_camera().with_push_frame(PushFrameGeometry {
        framelet_height: 4,
        line_scale_factor: 1.0,
        even_framelets: false,
    });
    let err = cam2map(&mut push_frame, &cropped, &aligned_mapping(), &options, &factory)
        .err()
        .expect("fractional crop");
    rp.check(
        matches!(err, TransformError::FractionalCrop { .. }),
        "fractional crop rejected",
    );

    assert!(rp.cleanup(), "warp regression test failed");
}

fn ring_mapping() -> Group {
    let mut g = Group::new("Mapping");
    g.set(Keyword::new("ProjectionName", "RingCylindrical"));
    g.set(Keyword::new("TargetName", TEST_TARGET));
    g.set(Keyword::new("RingLongitudeDirection", "CounterClockwise"));
    g.set(Keyword::new("RingLongitudeDomain", 360));
    g.set(Keyword::new("PixelResolution", 1000.0).with_unit("meters/pixel"));
    g.set(Keyword::new("MinimumRingRadius", TEST_RADIUS - 5000.0));
    g.set(Keyword::new("MaximumRingRadius", TEST_RADIUS + 5000.0));
    g.set(Keyword::new("MinimumRingLongitude", 9.5));
    g.set(Keyword::new("MaximumRingLongitude", 19.5));
    g.set(Keyword::new("CenterRingRadius", TEST_RADIUS));
    g.set(Keyword::new("CenterRingLongitude", 14.5));
    g
}

#[test]
fn rings_warp_reg() {
    let mut rp = RegParams::new("rings_warp");
    let factory = ProjectionFactory::default();
    let input = ramp_cube(10, 10, 1).unwrap();

    // Radius grows with sample, longitude with line; the map runs
    // longitude across and radius down, so the output is the transpose.
    let transposed = |output: &Cube| {
        let mut mismatches = 0;
        for l in 1..=10 {
            for s in 1..=10 {
                if output.read(s, l, 1) != input.read(l, s, 1) {
                    mismatches += 1;
                }
            }
        }
        mismatches
    };

    for algorithm in [WarpAlgorithm::Automatic, WarpAlgorithm::ForwardPatch] {
        eprintln!("  ring warp with {algorithm}");
        let mut label = mapping_label(ring_mapping());
        let sized = factory.create_for_cube(&mut label).expect("ring sizing");
        rp.compare_values(10.0, sized.samples as f64, 0.0);
        rp.compare_values(10.0, sized.lines as f64, 0.0);
        let mut projection = sized.projection;
        let mut output = Cube::new(sized.samples, sized.lines, 1)
            .unwrap()
            .with_label(label);
        let mut camera = RingCamera::new(10, 10, TEST_RADIUS - 4500.0, 1000.0, 10.0, 1.0);
        let options = WarpOptions {
            algorithm,
            interpolation: Interpolator::NearestNeighbor,
            patch_size: Some(4),
            ..WarpOptions::default()
        };
        let strategy = warp(&mut camera, &mut projection, &input, &mut output, &options)
            .expect("ring warp");
        let expected_forward = algorithm == WarpAlgorithm::ForwardPatch;
        rp.check(
            matches!(strategy, Strategy::ForwardPatch(_)) == expected_forward,
            "strategy follows the algorithm",
        );
        rp.compare_values(0.0, transposed(&output) as f64, 0.0);
    }

    assert!(rp.cleanup(), "rings warp regression test failed");
}

#[test]
fn map2map_reg() {
    let mut rp = RegParams::new("map2map");
    let factory = ProjectionFactory::default();

    // --- Test 1: positive east 360 to positive west 180 across the seam ---
    let mut label = mapping_label(with_ground_range(
        equirectangular_mapping(0.0, 0.0, 1000.0),
        -10.0,
        10.0,
        350.0,
        370.0,
    ));
    let sized = factory.create_for_cube(&mut label).expect("input sizing");
    rp.compare_values(20.0, sized.samples as f64, 0.0);
    let input = ramp_cube(20, 20, 1).unwrap().with_label(label);

    let mut user = Group::new("Mapping");
    user.set(Keyword::new("LongitudeDirection", "PositiveWest"));
    user.set(Keyword::new("LongitudeDomain", 180));
    let options = Map2MapOptions {
        interpolation: Interpolator::NearestNeighbor,
        ..Map2MapOptions::default()
    };
    let output = map2map(&input, &user, &options, &factory).expect("map2map");
    let mapping = output.label().mapping().unwrap();
    rp.compare_values(-10.0, mapping.f64("MinimumLongitude").unwrap(), 1e-9);
    rp.compare_values(10.0, mapping.f64("MaximumLongitude").unwrap(), 1e-9);
    let direction: LongitudeDirection =
        mapping.text("LongitudeDirection").unwrap().parse().unwrap();
    rp.check(direction == LongitudeDirection::PositiveWest, "direction");
    rp.compare_values(20.0, output.samples() as f64, 0.0);
    rp.compare_values(20.0, output.lines() as f64, 0.0);

    // Sample 1 is the west edge: 350 east
    rp.compare_values(input.read(1, 1, 1), output.read(1, 1, 1), 0.0);
    // 5.5 east lies past the input's 360 and wraps a full turn
    rp.compare_values(input.read(16, 3, 1), output.read(16, 3, 1), 0.0);
    rp.compare_values(0.0, count_mismatches(&input, &output, 1) as f64, 0.0);

    // --- Test 2: a range that ends up inverted is rejected ---
    let mut user = Group::new("Mapping");
    user.set(Keyword::new("MinimumLongitude", 20.0));
    user.set(Keyword::new("MaximumLongitude", 10.0));
    let inverted = Map2MapOptions {
        default_range: cartos_transform::SourceRange::Map,
        ..options.clone()
    };
    let err = map2map(&input, &user, &inverted, &factory)
        .err()
        .expect("inverted range");
    rp.check(
        matches!(err, TransformError::UnorderedLongitudes),
        "unordered longitudes",
    );

    assert!(rp.cleanup(), "map2map regression test failed");
}
