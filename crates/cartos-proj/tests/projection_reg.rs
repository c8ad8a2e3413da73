//! Projection regression test
//!
//! Random ground/projection round trips for every built-in projection on an
//! oblate body, universal coordinate conventions, and world mapping.

use cartos_core::{Group, Keyword, Label};
use cartos_proj::{MapProjection, ProjectionFactory, RingProjection, TProjection, WorldMapper};
use cartos_test::RegParams;

const EQ_RADIUS: f64 = 3_396_190.0;
const POL_RADIUS: f64 = 3_376_200.0;
const SAMPLES_PER_PROJECTION: usize = 200;

struct Case {
    name: &'static str,
    keywords: &'static [(&'static str, f64)],
    lat: (f64, f64),
    lon: (f64, f64),
}

const CASES: &[Case] = &[
    Case {
        name: "Sinusoidal",
        keywords: &[("CenterLongitude", 0.0)],
        lat: (-80.0, 80.0),
        lon: (-170.0, 170.0),
    },
    Case {
        name: "SimpleCylindrical",
        keywords: &[("CenterLongitude", 180.0)],
        lat: (-89.0, 89.0),
        lon: (10.0, 350.0),
    },
    Case {
        name: "Equirectangular",
        keywords: &[("CenterLatitude", 30.0), ("CenterLongitude", 0.0)],
        lat: (-89.0, 89.0),
        lon: (-170.0, 170.0),
    },
    Case {
        name: "Mercator",
        keywords: &[("CenterLatitude", 0.0), ("CenterLongitude", 0.0)],
        lat: (-80.0, 80.0),
        lon: (-170.0, 170.0),
    },
    Case {
        name: "PolarStereographic",
        keywords: &[("CenterLatitude", 90.0), ("CenterLongitude", 0.0)],
        lat: (5.0, 89.0),
        lon: (-179.0, 179.0),
    },
    Case {
        name: "Orthographic",
        keywords: &[("CenterLatitude", 20.0), ("CenterLongitude", 0.0)],
        lat: (-30.0, 60.0),
        lon: (-50.0, 50.0),
    },
    Case {
        name: "LambertConformal",
        keywords: &[
            ("CenterLatitude", 35.0),
            ("CenterLongitude", 0.0),
            ("FirstStandardParallel", 20.0),
            ("SecondStandardParallel", 50.0),
        ],
        lat: (0.0, 75.0),
        lon: (-90.0, 90.0),
    },
    Case {
        name: "LambertAzimuthalEqualArea",
        keywords: &[("CenterLatitude", -40.0), ("CenterLongitude", 0.0)],
        lat: (-85.0, 20.0),
        lon: (-80.0, 80.0),
    },
];

fn label_for(case: &Case) -> Label {
    let mut g = Group::new("Mapping");
    g.set(Keyword::new("ProjectionName", case.name));
    g.set(Keyword::new("EquatorialRadius", EQ_RADIUS).with_unit("meters"));
    g.set(Keyword::new("PolarRadius", POL_RADIUS).with_unit("meters"));
    g.set(Keyword::new("LatitudeType", "Planetocentric"));
    g.set(Keyword::new("LongitudeDirection", "PositiveEast"));
    g.set(Keyword::new("LongitudeDomain", 180));
    for (name, value) in case.keywords {
        g.set(Keyword::new(*name, *value).with_unit("degrees"));
    }
    Label::from(g)
}

fn lon_diff(a: f64, b: f64) -> f64 {
    ((a - b + 540.0).rem_euclid(360.0) - 180.0).abs()
}

fn planetary(projection: MapProjection) -> Box<dyn TProjection> {
    projection.into_planetary().expect("planetary projection")
}

#[test]
fn projection_reg() {
    let mut rp = RegParams::new("projection");
    let factory = ProjectionFactory::default();

    // --- Test 1: ground -> xy -> ground round trip ---
    for case in CASES {
        let mut proj = planetary(factory.create(&label_for(case), false).expect(case.name));
        let mut worst: f64 = 0.0;
        for _ in 0..SAMPLES_PER_PROJECTION {
            let lat = rand::random_range(case.lat.0..case.lat.1);
            let lon = rand::random_range(case.lon.0..case.lon.1);
            if !proj.set_ground(lat, lon) {
                rp.check(false, &format!("{} forward at ({lat}, {lon})", case.name));
                continue;
            }
            let (x, y) = (proj.x_coord(), proj.y_coord());
            if !proj.set_coordinate(x, y) {
                rp.check(false, &format!("{} inverse at ({x}, {y})", case.name));
                continue;
            }
            worst = worst
                .max((proj.latitude() - lat).abs())
                .max(lon_diff(proj.longitude(), lon));
        }
        eprintln!("  {}: worst ground error {worst:e} deg", case.name);
        rp.compare_values(0.0, worst, 1e-8);
    }

    // --- Test 2: xy -> ground -> xy round trip through the world mapper ---
    for case in CASES {
        let mut proj = planetary(factory.create(&label_for(case), false).expect(case.name));
        proj.set_world_mapper(WorldMapper::new(250.0, -1.0e6, 1.0e6));
        let mut worst: f64 = 0.0;
        for _ in 0..SAMPLES_PER_PROJECTION {
            let lat = rand::random_range(case.lat.0..case.lat.1);
            let lon = rand::random_range(case.lon.0..case.lon.1);
            if !proj.set_ground(lat, lon) {
                continue;
            }
            let (wx, wy) = (proj.world_x(), proj.world_y());
            if !proj.set_world(wx, wy) {
                rp.check(false, &format!("{} set_world", case.name));
                continue;
            }
            worst = worst
                .max((proj.world_x() - wx).abs())
                .max((proj.world_y() - wy).abs());
        }
        rp.compare_values(0.0, worst, 1e-6);
    }

    // --- Test 3: universal coordinates ignore the mapping's conventions ---
    let mut g = label_for(&CASES[0]).mapping().unwrap();
    g.set(Keyword::new("LatitudeType", "Planetographic"));
    g.set(Keyword::new("LongitudeDirection", "PositiveWest"));
    g.set(Keyword::new("LongitudeDomain", 180));
    let mut proj = planetary(factory.create(&Label::from(g), false).unwrap());
    for _ in 0..SAMPLES_PER_PROJECTION {
        let lat = rand::random_range(-80.0..80.0);
        let lon = rand::random_range(0.0..360.0);
        rp.check(proj.set_universal_ground(lat, lon), "universal ground");
        let ulat = proj.universal_latitude();
        let ulon = proj.universal_longitude();
        rp.check((-90.0..=90.0).contains(&ulat), "universal latitude range");
        rp.check((0.0..360.0).contains(&ulon), "universal longitude range");
        rp.compare_values(lat, ulat, 1e-9);
        rp.compare_values(0.0, lon_diff(ulon, lon), 1e-9);
        rp.check(
            (-180.0..=180.0).contains(&proj.longitude()),
            "mapping longitude in 180 domain",
        );
    }

    // --- Test 4: ring-plane round trip ---
    let mut g = Group::new("Mapping");
    g.set(Keyword::new("ProjectionName", "Planar"));
    g.set(Keyword::new("RingLongitudeDirection", "Clockwise"));
    g.set(Keyword::new("RingLongitudeDomain", 360));
    g.set(Keyword::new("CenterRingLongitude", 0.0));
    g.set(Keyword::new("CenterRingRadius", 1.0e8));
    let mut ring = factory
        .create(&Label::from(g), false)
        .unwrap()
        .into_ring()
        .unwrap();
    for _ in 0..SAMPLES_PER_PROJECTION {
        let radius = rand::random_range(7.0e7..1.4e8);
        let lon = rand::random_range(0.0..360.0);
        rp.check(ring.set_ground(radius, lon), "ring forward");
        let (x, y) = (ring.x_coord(), ring.y_coord());
        rp.check(ring.set_coordinate(x, y), "ring inverse");
        rp.compare_values(radius, ring.ring_radius(), 1e-5);
        rp.compare_values(0.0, lon_diff(ring.ring_longitude(), lon), 1e-9);
    }

    assert!(rp.cleanup(), "projection regression test failed");
}
