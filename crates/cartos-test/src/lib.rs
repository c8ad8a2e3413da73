//! cartos-test - Regression harness and synthetic fixtures for cartos
//!
//! The `tests/*_reg.rs` suites of every crate drive their checks through
//! [`RegParams`], which counts checks, collects failures and compares text
//! output with golden files under `tests/golden` at the workspace root.
//! Set `REGTEST_MODE=generate` to rewrite the golden files.
//!
//! The fixtures run on a spherical test body where one degree of arc spans
//! 1000 metres: [`LinearCamera`], [`PolarCamera`] and [`RingCamera`],
//! cube builders and `Mapping` group builders.
//!
//! ```ignore
//! use cartos_test::RegParams;
//!
//! let mut rp = RegParams::new("overlap");
//! rp.compare_values(4.0, overlaps.len() as f64, 0.0);
//! rp.write_text_and_check(&overlaps.to_text(), "lis")?;
//! assert!(rp.cleanup());
//! ```

mod error;
pub mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use fixtures::{
    LinearCamera, PolarCamera, RingCamera, TEST_RADIUS, TEST_TARGET, cube_with_value,
    equirectangular_mapping, mapping_label, ramp_cube, sinusoidal_mapping, with_ground_range,
};
pub use params::{RegParams, RegTestMode};

/// `tests/<kind>` under the workspace root; this crate lives two levels
/// below it.
fn workspace_tests_dir(kind: &str) -> String {
    format!("{}/../../tests/{kind}", env!("CARGO_MANIFEST_DIR"))
}

pub fn golden_dir() -> String {
    workspace_tests_dir("golden")
}

pub fn regout_dir() -> String {
    workspace_tests_dir("regout")
}
