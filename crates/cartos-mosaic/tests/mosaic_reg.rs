//! Mosaic regression test
//!
//! Overlap enumeration (three-footprint partition, union law over random
//! rectangles, footprints read from cube blobs), placement priorities,
//! origin tracking, map-projected placement across the 0/360 seam and the
//! push-frame stitch round trip.

use cartos_core::pixel::is_null;
use cartos_core::{Cube, Group, Keyword, Label, PixelType, RasterView};
use cartos_geom::footprint::write_footprint;
use cartos_geom::{area, equal, union};
use cartos_mosaic::{
    BandCriteria, MapMosaic, Mosaic, MosaicOptions, OverlapOptions, OverlapSet, Priority,
    StitchOptions, stitch, unstitch,
};
use cartos_test::{RegParams, cube_with_value, equirectangular_mapping, mapping_label, ramp_cube};
use geo::{MultiPolygon, polygon};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)
    ]])
}

fn projected(cube: Cube, upper_left_x: f64, upper_left_y: f64, name: &str) -> Cube {
    let mut mapping = equirectangular_mapping(0.0, 0.0, 1000.0);
    mapping.set(Keyword::new("UpperLeftCornerX", upper_left_x));
    mapping.set(Keyword::new("UpperLeftCornerY", upper_left_y));
    cube.with_name(name).with_label(mapping_label(mapping))
}

fn framelet(filter: &str, number: i64, value: f64) -> Cube {
    let mut instrument = Group::new("Instrument");
    instrument.set(Keyword::new("SpacecraftName", "TEST"));
    instrument.set(Keyword::new("ObservationId", "OBS_7"));
    instrument.set(Keyword::new("StartTime", "2012-06-01T12:00:00"));
    instrument.set(Keyword::new("FrameletNumber", number));
    let mut band_bin = Group::new("BandBin");
    band_bin.set(Keyword::new("FilterName", filter));
    band_bin.set(Keyword::new("Center", 0.5 + number as f64).with_unit("micrometers"));
    let mut label = Label::from(instrument);
    label.add_group(band_bin);
    let mut cube = ramp_cube(4, 3, 1)
        .unwrap()
        .with_name(format!("{filter}_{number}.cub"))
        .with_label(label)
        .with_pixel_type(PixelType::SignedWord);
    for v in cube.data_mut() {
        *v += value;
    }
    cube
}

#[test]
fn mosaic_reg() {
    let mut rp = RegParams::new("mosaic");

    // --- Test 1: three footprints, two overlapping ---
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(5.0, 5.0, 15.0, 15.0);
    let c = rect(30.0, 30.0, 35.0, 35.0);
    let mut set = OverlapSet::new(OverlapOptions::default());
    set.find_overlaps([("A", a.clone()), ("B", b.clone()), ("C", c.clone())])
        .unwrap();
    rp.compare_values(4.0, set.len() as f64, 0.0);
    rp.check(set.errors().is_empty(), "no overlap errors");
    let find = |sns: &[&str]| {
        set.iter().find(|o| {
            o.len() == sns.len() && sns.iter().all(|sn| o.has_serial_number(sn))
        })
    };
    let only_a = find(&["A"]).unwrap();
    let only_b = find(&["B"]).unwrap();
    let both = find(&["A", "B"]).unwrap();
    let only_c = find(&["C"]).unwrap();
    rp.compare_values(75.0, only_a.area(), 1e-9);
    rp.compare_values(75.0, only_b.area(), 1e-9);
    rp.check(equal(both.polygon(), &rect(5.0, 5.0, 10.0, 10.0)), "A and B share 5..10");
    rp.check(equal(only_c.polygon(), &c), "C is untouched");
    rp.compare_values(3.0, set.overlaps_for("A").len() as f64, 0.0);

    // --- Test 2: overlap list text ---
    let text = set.to_text();
    let read = OverlapSet::read_from_str(&text).unwrap();
    rp.compare_values(set.len() as f64, read.len() as f64, 0.0);
    rp.compare_strings(text.as_bytes(), read.to_text().as_bytes());
    rp.write_text_and_check(&text, "lis").unwrap();

    // --- Test 3: overlaps partition the union of random footprints ---
    for _ in 0..10 {
        let footprints: Vec<(String, MultiPolygon<f64>)> = (0..4)
            .map(|i| {
                let x = rand::random_range(0.0..20.0);
                let y = rand::random_range(0.0..20.0);
                let w = rand::random_range(2.0..12.0);
                let h = rand::random_range(2.0..12.0);
                (format!("IMG{i}"), rect(x, y, x + w, y + h))
            })
            .collect();
        let mut inputs_union = MultiPolygon::new(vec![]);
        for (_, f) in &footprints {
            inputs_union = union(&inputs_union, f).unwrap();
        }
        let mut set = OverlapSet::default();
        set.find_overlaps(footprints).unwrap();
        let mut pieces_union = MultiPolygon::new(vec![]);
        let mut pieces_area = 0.0;
        for o in &set {
            pieces_union = union(&pieces_union, o.polygon()).unwrap();
            pieces_area += o.area();
        }
        let expected = area(&inputs_union);
        rp.compare_values(expected, area(&pieces_union), 1e-6 * expected);
        rp.compare_values(expected, pieces_area, 1e-6 * expected);
    }

    // --- Test 4: footprints read from cube blobs ---
    let mut left = Cube::new(4, 4, 1).unwrap().with_name("left.cub");
    let mut right = Cube::new(4, 4, 1).unwrap().with_name("right.cub");
    let unwritten = Cube::new(4, 4, 1).unwrap().with_name("none.cub");
    write_footprint(&mut left, &rect(0.0, 0.0, 2.0, 2.0)).unwrap();
    write_footprint(&mut right, &rect(1.0, 0.0, 3.0, 2.0)).unwrap();
    let mut set = OverlapSet::default();
    set.find_image_overlaps(&[
        ("L", &left as &dyn RasterView),
        ("R", &right as &dyn RasterView),
        ("N", &unwritten as &dyn RasterView),
    ])
        .unwrap();
    rp.compare_values(3.0, set.len() as f64, 0.0);
    rp.compare_values(1.0, set.errors().len() as f64, 0.0);
    rp.check(
        set.errors()[0].description.contains("none.cub"),
        "unreadable footprint names its file",
    );

    // --- Test 5: beneath keeps the first image ---
    let engine = Mosaic::new(MosaicOptions {
        priority: Priority::PlaceImagesBeneath,
        ..MosaicOptions::default()
    });
    let mut mosaic = engine.create(6, 6, 1, PixelType::Real).unwrap();
    let image1 = cube_with_value(6, 6, 1, 100.0).unwrap().with_name("image1.cub");
    let image2 = cube_with_value(6, 6, 1, 200.0).unwrap().with_name("image2.cub");
    engine.place(&image1, &mut mosaic, 1, 1, 1).unwrap();
    engine.place(&image2, &mut mosaic, 1, 1, 1).unwrap();
    rp.check(mosaic.data().iter().all(|&v| v == 100.0), "all pixels stay 100");

    // --- Test 6: on top replaces ---
    let engine = Mosaic::default();
    engine.place(&image2, &mut mosaic, 4, 4, 1).unwrap();
    rp.compare_values(100.0, mosaic.read(3, 3, 1), 0.0);
    rp.compare_values(200.0, mosaic.read(4, 4, 1), 0.0);
    rp.compare_values(200.0, mosaic.read(6, 6, 1), 0.0);

    // --- Test 7: band priority with origin tracking ---
    let engine = Mosaic::new(MosaicOptions {
        priority: Priority::UseBandPlacementCriteria,
        criteria: BandCriteria::Lesser,
        track: true,
        ..MosaicOptions::default()
    });
    let mut mosaic = engine.create(5, 5, 1, PixelType::Real).unwrap();
    let high = cube_with_value(3, 3, 1, 5.0).unwrap().with_name("high.cub");
    let low = cube_with_value(3, 3, 1, 3.0).unwrap().with_name("low.cub");
    engine.place(&high, &mut mosaic, 1, 1, 1).unwrap();
    engine.place(&low, &mut mosaic, 2, 2, 1).unwrap();
    engine.place(&high, &mut mosaic, 1, 1, 1).unwrap();
    rp.compare_values(5.0, mosaic.read(1, 1, 1), 0.0);
    rp.compare_values(3.0, mosaic.read(2, 2, 1), 0.0);
    rp.compare_values(3.0, mosaic.read(3, 3, 1), 0.0);
    let owner = Mosaic::origin_of(&mosaic, mosaic.read(3, 3, 2)).unwrap().unwrap();
    rp.compare_strings(b"low.cub", owner.file_name.as_bytes());
    let owner = Mosaic::origin_of(&mosaic, mosaic.read(1, 3, 2)).unwrap().unwrap();
    rp.compare_strings(b"high.cub", owner.file_name.as_bytes());
    rp.check(is_null(mosaic.read(5, 1, 2)), "untouched pixel has no origin");
    rp.compare_values(2.0, Mosaic::input_images(&mosaic).unwrap().len() as f64, 0.0);

    // --- Test 8: map mosaic of two overlapping tiles ---
    let west = projected(cube_with_value(10, 4, 1, 1.0).unwrap(), 0.0, 4000.0, "west.cub");
    let east = projected(cube_with_value(10, 4, 1, 2.0).unwrap(), 6000.0, 2000.0, "east.cub");
    let engine = MapMosaic::default();
    let mut out = engine.create_output(&[&west, &east], PixelType::Real).unwrap();
    rp.compare_values(16.0, out.samples() as f64, 0.0);
    rp.compare_values(6.0, out.lines() as f64, 0.0);
    rp.check(engine.place(&west, &mut out).unwrap(), "west placed");
    rp.check(engine.place(&east, &mut out).unwrap(), "east placed");
    rp.compare_values(1.0, out.read(1, 1, 1), 0.0);
    rp.compare_values(2.0, out.read(7, 3, 1), 0.0);
    rp.compare_values(2.0, out.read(16, 6, 1), 0.0);
    rp.check(is_null(out.read(16, 1, 1)), "outside both tiles");

    // --- Test 9: map placement repeats across 360 degrees ---
    let mut global = projected(Cube::new(360, 2, 1).unwrap(), 0.0, 1000.0, "global.cub");
    let seam = projected(ramp_cube(10, 2, 1).unwrap(), 355_000.0, 1000.0, "seam.cub");
    rp.check(engine.place(&seam, &mut global).unwrap(), "seam image placed");
    rp.compare_values(1101.0, global.read(356, 1, 1), 0.0);
    rp.compare_values(1105.0, global.read(360, 1, 1), 0.0);
    rp.compare_values(1106.0, global.read(1, 1, 1), 0.0);
    rp.compare_values(1210.0, global.read(5, 2, 1), 0.0);
    rp.check(is_null(global.read(6, 1, 1)), "wrapped copy ends at 5");
    let far = projected(Cube::new(2, 2, 1).unwrap(), 0.0, 900_000.0, "far.cub");
    rp.check(!engine.place(&far, &mut global).unwrap(), "no overlap returns false");

    // --- Test 10: stitch and unstitch ---
    let framelets = [
        framelet("RED", 2, 20.0),
        framelet("RED", 1, 10.0),
        framelet("BLUE", 1, 30.0),
        framelet("BLUE", 2, 40.0),
        framelet("IR", 1, 50.0),
    ];
    let views: Vec<&dyn RasterView> = framelets.iter().map(|f| f as &dyn RasterView).collect();
    let options = StitchOptions {
        geometric_flip: true,
        time_flip: false,
    };
    let stitched = stitch(&views, options).unwrap();
    rp.compare_values(1.0, stitched.len() as f64, 0.0);
    let cube = &stitched[0];
    rp.compare_values(3.0, cube.bands() as f64, 0.0);
    rp.compare_values(6.0, cube.lines() as f64, 0.0);
    rp.check(is_null(cube.read(1, 4, 3)), "short band padded with Null");
    // RED framelet 1, flipped: its third line first
    rp.compare_values(10.0 + 1301.0, cube.read(1, 1, 1), 0.0);
    rp.check(cube.pixel_type() == PixelType::SignedWord, "pixel type kept");
    let restored = unstitch(cube).unwrap();
    rp.compare_values(framelets.len() as f64, restored.len() as f64, 0.0);
    for original in &framelets {
        match restored.iter().find(|r| r.file_name() == original.file_name()) {
            Some(back) => {
                rp.compare_cubes(original, back);
                rp.check(back.label() == original.label(), "label restored");
            }
            None => {
                rp.check(false, &format!("{} not restored", original.file_name()));
            }
        }
    }

    assert!(rp.cleanup(), "mosaic regression test failed");
}
