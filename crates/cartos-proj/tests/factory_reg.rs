//! Projection factory regression test
//!
//! Output sizing from a ground range and from a camera, label
//! normalisation, and error classes.

use cartos_core::{EXIT_UNSUPPORTED, ErrorKind, Keyword, Label};
use cartos_proj::{ProjectionError, ProjectionFactory, TProjection};
use cartos_test::{LinearCamera, RegParams, mapping_label, sinusoidal_mapping, with_ground_range};

fn range_label(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Label {
    mapping_label(with_ground_range(
        sinusoidal_mapping(0.0, 1000.0),
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    ))
}

#[test]
fn factory_reg() {
    let mut rp = RegParams::new("factory");
    let factory = ProjectionFactory::default();

    // --- Test 1: size from a ground range ---
    let mut label = range_label(-10.0, 10.0, 0.0, 20.0);
    let sized = factory.create_for_cube(&mut label).expect("create_for_cube");
    rp.compare_values(20.0, sized.samples as f64, 0.0);
    rp.compare_values(20.0, sized.lines as f64, 0.0);
    let mapping = label.mapping().unwrap();
    rp.compare_values(0.0, mapping.f64("UpperLeftCornerX").unwrap(), 1e-6);
    rp.compare_values(10000.0, mapping.f64("UpperLeftCornerY").unwrap(), 1e-6);
    rp.compare_values(1000.0, mapping.f64("PixelResolution").unwrap(), 0.0);
    rp.compare_values(1.0, mapping.f64("Scale").unwrap(), 1e-9);
    rp.check(
        mapping.keyword("UpperLeftCornerX").unwrap().unit() == Some("meters"),
        "corner unit",
    );
    rp.check(mapping.has_keyword("CenterLongitude"), "centre keyword kept");

    // --- Test 2: sizing twice leaves the label unchanged ---
    let first = label.clone();
    let again = factory.create_for_cube(&mut label).expect("second pass");
    rp.check(label == first, "create_for_cube is idempotent");
    rp.compare_values(sized.samples as f64, again.samples as f64, 0.0);
    rp.compare_values(sized.lines as f64, again.lines as f64, 0.0);

    // --- Test 3: degenerate range still yields a pixel ---
    let mut label = range_label(5.0, 5.0, 10.0, 10.0);
    let sized = factory.create_for_cube(&mut label).expect("degenerate");
    rp.check(sized.samples >= 1 && sized.lines >= 1, "at least one pixel");

    // --- Test 4: Scale instead of PixelResolution ---
    let mut label = range_label(0.0, 1.0, 0.0, 1.0);
    {
        let mapping = label.group_mut("Mapping").unwrap();
        mapping.remove_keyword("PixelResolution");
        mapping.set(Keyword::new("Scale", 2.0).with_unit("pixels/degree"));
    }
    factory.create_for_cube(&mut label).expect("scale only");
    let res = label.mapping().unwrap().f64("PixelResolution").unwrap();
    rp.compare_values(500.0, res, 1e-9);

    // --- Test 5: errors ---
    let mut label = range_label(0.0, 1.0, 0.0, 1.0);
    label
        .group_mut("Mapping")
        .unwrap()
        .set(Keyword::new("ProjectionName", "Robinson"));
    let err = factory.create_for_cube(&mut label).err().expect("unknown");
    rp.check(
        matches!(err, ProjectionError::Unsupported { .. }),
        "unknown projection",
    );
    rp.compare_values(EXIT_UNSUPPORTED as f64, err.exit_code() as f64, 0.0);

    let mut label = range_label(0.0, 1.0, 0.0, 1.0);
    label
        .group_mut("Mapping")
        .unwrap()
        .remove_keyword("PixelResolution");
    let err = factory.create_for_cube(&mut label).err().expect("no resolution");
    rp.check(err.kind() == ErrorKind::User, "missing resolution is a user error");

    let mut label = mapping_label(sinusoidal_mapping(0.0, 1000.0));
    let err = factory.create_for_cube(&mut label).err().expect("no range");
    rp.check(
        matches!(err, ProjectionError::InvalidGroundRange(_)),
        "missing ground range",
    );

    let mut label = range_label(10.0, -10.0, 0.0, 1.0);
    let err = factory.create_for_cube(&mut label).err().expect("inverted");
    rp.check(err.to_string().contains("MinimumLatitude"), "range order message");

    // --- Test 6: rebuild from a sized label ---
    let mut label = range_label(-10.0, 10.0, 0.0, 20.0);
    factory.create_for_cube(&mut label).unwrap();
    let rebuilt = factory.create_from_cube(&label).expect("create_from_cube");
    let mapper = rebuilt.world_mapper().copied().expect("world mapper");
    rp.compare_values(1000.0, mapper.resolution(), 0.0);
    rp.compare_values(10000.0, mapper.upper_left_y(), 1e-6);
    let mut proj = rebuilt.into_planetary().unwrap();
    rp.check(proj.set_world(1.0, 1.0), "upper-left pixel");
    rp.compare_values(9.5, proj.latitude(), 1e-9);

    // --- Test 7: size from a camera ---
    let mut camera = LinearCamera::north_up(10, 10, 20.0, 30.0);
    let mut label = mapping_label(sinusoidal_mapping(35.0, 1000.0));
    let sized = factory
        .create_for_cube_with_camera(&mut label, &mut camera)
        .expect("camera sizing");
    let mapping = label.mapping().unwrap();
    rp.compare_values(10.5, mapping.f64("MinimumLatitude").unwrap(), 1e-9);
    rp.compare_values(20.5, mapping.f64("MaximumLatitude").unwrap(), 1e-9);
    rp.compare_values(29.5, mapping.f64("MinimumLongitude").unwrap(), 1e-9);
    rp.compare_values(39.5, mapping.f64("MaximumLongitude").unwrap(), 1e-9);
    rp.compare_values(9.0, sized.samples as f64, 0.0);
    rp.compare_values(11.0, sized.lines as f64, 0.0);
    rp.compare_values(21000.0, mapping.f64("UpperLeftCornerY").unwrap(), 1e-6);
    eprintln!("  camera sizing: {} x {}", sized.samples, sized.lines);

    assert!(rp.cleanup(), "factory regression test failed");
}
