//! Core data model regression test
//!
//! Label text, marker pixels, longitude conventions and alpha cube
//! bookkeeping.

use cartos_core::conventions::{in_longitude_range, to_180_domain, to_360_domain};
use cartos_core::pixel::{HRS, LIS, NULL, is_high, is_low, is_null, is_special, is_valid};
use cartos_core::{AlphaCube, Cube, Group, Keyword, Label, PixelType, RasterView, Value};
use cartos_test::RegParams;

const LABEL_TEXT: &str = "\
Object = IsisCube
  Group = Instrument
    SpacecraftName = \"MARS RECONNAISSANCE ORBITER\"
    FrameletNumber = 3
  End_Group
  Group = BandBin
    FilterName = (RED, BLU,
                  NA)
  End_Group
End_Object
End
";

#[test]
fn core_reg() {
    let mut rp = RegParams::new("core");

    // --- Test 1: label text survives a write/read cycle ---
    let label = Label::read_from_str(LABEL_TEXT).unwrap();
    let instrument = label.group("Instrument").unwrap();
    rp.compare_strings(
        b"MARS RECONNAISSANCE ORBITER",
        instrument.text("SpacecraftName").unwrap().as_bytes(),
    );
    rp.compare_values(3.0, instrument.i64("FrameletNumber").unwrap() as f64, 0.0);
    let filters = label.group("BandBin").unwrap().keyword("FilterName").unwrap();
    rp.compare_values(3.0, filters.len() as f64, 0.0);
    rp.compare_strings(b"NA", filters.text_at(2).as_bytes());

    let text = label.write_to_string();
    let again = Label::read_from_str(&text).unwrap();
    rp.compare_labels(&label, &again);
    rp.write_text_and_check(&text, "lbl").unwrap();
    rp.check(label.group("Mapping").is_err(), "missing group is an error");

    // --- Test 2: group editing ---
    let mut edited = Label::from(Group::new("Mapping"));
    let mapping = edited.group_mut("Mapping").unwrap();
    mapping.set(Keyword::new("CenterLongitude", 180.0).with_unit("degrees"));
    mapping.set(Keyword::new("CenterLongitude", 90.0));
    rp.compare_values(90.0, mapping.f64("CenterLongitude").unwrap(), 0.0);
    rp.check(mapping.keywords().len() == 1, "set replaces in place");
    mapping.set(Keyword::with_values(
        "Corners",
        vec![Value::from(1), Value::from(2.5)],
    ));
    rp.compare_values(2.5, mapping.keyword("Corners").unwrap().f64_at(1).unwrap(), 0.0);
    rp.check(mapping.remove_keyword("Corners").is_some(), "keyword removed");
    rp.check(edited.mapping().is_ok(), "mapping group found");

    // --- Test 3: marker pixels ---
    rp.check(is_null(NULL) && is_special(NULL) && !is_valid(NULL), "null marker");
    rp.check(is_high(HRS) && !is_low(HRS), "high representation saturation");
    rp.check(is_low(LIS) && !is_high(LIS), "low instrument saturation");
    rp.check(is_valid(0.0) && is_valid(-1.0e30), "measurements are valid");

    let mut cube = Cube::new_with_value(4, 3, 2, 7.0)
        .unwrap()
        .with_pixel_type(PixelType::UnsignedByte);
    rp.check(is_null(cube.read(0, 1, 1)), "left of the raster reads null");
    rp.check(is_null(cube.read(5, 1, 1)), "right of the raster reads null");
    rp.check(is_null(cube.read(1, 1, 3)), "missing band reads null");
    cube.write(4, 3, 2, 9.0).unwrap();
    rp.compare_values(9.0, cube.read(4, 3, 2), 0.0);
    rp.check(cube.write(5, 3, 2, 9.0).is_err(), "write outside fails");
    rp.compare_values(1.0, cube.pixel_type().tracking_offset() as f64, 0.0);
    rp.compare_values(254.0, cube.pixel_type().tracking_capacity() as f64, 0.0);
    rp.check("signedword".parse::<PixelType>().unwrap() == PixelType::SignedWord, "pixel type parse");
    rp.check("Float".parse::<PixelType>().is_err(), "unknown pixel type");

    // --- Test 4: longitude domains ---
    rp.compare_values(350.0, to_360_domain(-10.0), 1e-12);
    rp.compare_values(360.0, to_360_domain(360.0), 0.0);
    rp.compare_values(-170.0, to_180_domain(190.0), 1e-12);
    rp.compare_values(180.0, to_180_domain(180.0), 0.0);
    rp.check(in_longitude_range(350.0, 10.0, 5.0), "range through zero");
    rp.check(!in_longitude_range(350.0, 10.0, 180.0), "outside a wrapped range");
    rp.check(in_longitude_range(-180.0, 180.0, 271.0), "full circle");

    // --- Test 5: alpha cube bookkeeping ---
    let identity = AlphaCube::identity(100, 50);
    rp.compare_values(17.0, identity.alpha_sample(17.0), 1e-12);
    // Samples 11..=60 of the alpha image, then every second one
    let cropped = identity.crop(10.5, 0.5, 60.5, 50.5, 25, 50);
    rp.compare_values(11.5, cropped.alpha_sample(1.0), 1e-12);
    rp.compare_values(1.0, cropped.beta_sample(11.5), 1e-12);
    let group = cropped.to_group();
    let reread = AlphaCube::from_label(&Label::from(group), 25, 50).unwrap();
    rp.check(reread == cropped, "alpha cube group round trip");

    assert!(rp.cleanup(), "core regression test failed");
}
