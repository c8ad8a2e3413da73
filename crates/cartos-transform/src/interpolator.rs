//! Resampling of an input raster at fractional positions
//!
//! Positions use the pixel-centre convention: sample `s` is the centre of
//! pixel `s`, and the raster covers `[0.5, samples + 0.5]`.
//!
//! | Kind | Taps | Weights |
//! |---|---|---|
//! | `NearestNeighbor` | 1x1 | the pixel containing the position |
//! | `BiLinear` | 2x2 | separable linear |
//! | `CubicConvolution` | 4x4 | separable cubic convolution, `a = -0.5` |
//!
//! Taps falling off the raster edge repeat the edge pixel. If any tap is
//! `NULL` the result is `NULL`; if any tap holds another special value the
//! nearest pixel is returned unchanged.

use crate::error::TransformError;
use cartos_core::RasterView;
use cartos_core::pixel::{NULL, is_null, is_special};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cubic convolution kernel parameter.
const CUBIC_A: f64 = -0.5;

/// Interpolation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolator {
    NearestNeighbor,
    BiLinear,
    #[default]
    CubicConvolution,
}

impl Interpolator {
    /// Neighbourhood width and height in pixels.
    pub fn size(self) -> usize {
        match self {
            Interpolator::NearestNeighbor => 1,
            Interpolator::BiLinear => 2,
            Interpolator::CubicConvolution => 4,
        }
    }

    /// Resample `band` of `input` at `(sample, line)`.
    ///
    /// Positions outside `[0.5, N + 0.5]` give `NULL`.
    pub fn interpolate(self, input: &dyn RasterView, sample: f64, line: f64, band: usize) -> f64 {
        let (ns, nl) = (input.samples() as f64, input.lines() as f64);
        if !(0.5..=ns + 0.5).contains(&sample) || !(0.5..=nl + 0.5).contains(&line) {
            return NULL;
        }
        let nearest = || {
            input.read(
                clamp_tap((sample + 0.5).floor() as i64, input.samples()),
                clamp_tap((line + 0.5).floor() as i64, input.lines()),
                band,
            )
        };
        match self {
            Interpolator::NearestNeighbor => nearest(),
            Interpolator::BiLinear => {
                let s0 = sample.floor();
                let l0 = line.floor();
                let ws = [1.0 - (sample - s0), sample - s0];
                let wl = [1.0 - (line - l0), line - l0];
                match convolve::<2>(input, s0 as i64, l0 as i64, band, &ws, &wl) {
                    Taps::Value(v) => v,
                    Taps::Null => NULL,
                    Taps::Special => nearest(),
                }
            }
            Interpolator::CubicConvolution => {
                let s0 = sample.floor();
                let l0 = line.floor();
                let ws = cubic_weights(sample - s0);
                let wl = cubic_weights(line - l0);
                match convolve::<4>(input, s0 as i64 - 1, l0 as i64 - 1, band, &ws, &wl) {
                    Taps::Value(v) => v,
                    Taps::Null => NULL,
                    Taps::Special => nearest(),
                }
            }
        }
    }
}

enum Taps {
    Value(f64),
    Null,
    Special,
}

fn clamp_tap(index: i64, count: usize) -> i64 {
    index.clamp(1, count.max(1) as i64)
}

/// Weighted sum over an `N x N` neighbourhood whose first tap is
/// `(first_sample, first_line)`.
fn convolve<const N: usize>(
    input: &dyn RasterView,
    first_sample: i64,
    first_line: i64,
    band: usize,
    ws: &[f64; N],
    wl: &[f64; N],
) -> Taps {
    let mut sum = 0.0;
    let mut special = false;
    for (j, wy) in wl.iter().enumerate() {
        let l = clamp_tap(first_line + j as i64, input.lines());
        for (i, wx) in ws.iter().enumerate() {
            let s = clamp_tap(first_sample + i as i64, input.samples());
            let v = input.read(s, l, band);
            if is_null(v) {
                return Taps::Null;
            }
            if is_special(v) {
                special = true;
                continue;
            }
            sum += v * wx * wy;
        }
    }
    if special { Taps::Special } else { Taps::Value(sum) }
}

/// Weights of the four taps at offsets `-1, 0, 1, 2` for fraction `t`.
fn cubic_weights(t: f64) -> [f64; 4] {
    let kernel = |x: f64| {
        let x = x.abs();
        if x <= 1.0 {
            (CUBIC_A + 2.0) * x.powi(3) - (CUBIC_A + 3.0) * x.powi(2) + 1.0
        } else if x < 2.0 {
            CUBIC_A * x.powi(3) - 5.0 * CUBIC_A * x.powi(2) + 8.0 * CUBIC_A * x - 4.0 * CUBIC_A
        } else {
            0.0
        }
    };
    [kernel(t + 1.0), kernel(t), kernel(1.0 - t), kernel(2.0 - t)]
}

impl fmt::Display for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interpolator::NearestNeighbor => "NearestNeighbor",
            Interpolator::BiLinear => "BiLinear",
            Interpolator::CubicConvolution => "CubicConvolution",
        };
        f.write_str(s)
    }
}

impl FromStr for Interpolator {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearestneighbor" | "nearest" => Ok(Interpolator::NearestNeighbor),
            "bilinear" => Ok(Interpolator::BiLinear),
            "cubicconvolution" | "cubic" => Ok(Interpolator::CubicConvolution),
            _ => Err(TransformError::UnknownOption {
                parameter: "INTERP".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::Cube;
    use cartos_core::pixel::{HIS, is_null};

    fn ramp() -> Cube {
        // value = 10 * line + sample
        let mut data = Vec::new();
        for l in 1..=4 {
            for s in 1..=4 {
                data.push((10 * l + s) as f64);
            }
        }
        Cube::from_data(4, 4, 1, data).unwrap()
    }

    #[test]
    fn test_nearest() {
        let cube = ramp();
        let nn = Interpolator::NearestNeighbor;
        assert_eq!(nn.interpolate(&cube, 2.0, 3.0, 1), 32.0);
        assert_eq!(nn.interpolate(&cube, 2.49, 3.51, 1), 42.0);
        assert_eq!(nn.interpolate(&cube, 0.5, 0.5, 1), 11.0);
        assert_eq!(nn.interpolate(&cube, 4.5, 4.5, 1), 44.0);
    }

    #[test]
    fn test_out_of_extent_is_null() {
        let cube = ramp();
        for interp in [
            Interpolator::NearestNeighbor,
            Interpolator::BiLinear,
            Interpolator::CubicConvolution,
        ] {
            assert!(is_null(interp.interpolate(&cube, 0.49, 2.0, 1)));
            assert!(is_null(interp.interpolate(&cube, 2.0, 4.51, 1)));
        }
    }

    #[test]
    fn test_bilinear_is_exact_on_planes() {
        let cube = ramp();
        let v = Interpolator::BiLinear.interpolate(&cube, 2.25, 2.5, 1);
        assert!((v - 27.25).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_reproduces_interior_linear_ramp() {
        let cube = ramp();
        let v = Interpolator::CubicConvolution.interpolate(&cube, 2.5, 2.5, 1);
        assert!((v - 27.5).abs() < 1e-12);
        let w = cubic_weights(0.3);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_null_tap_propagates() {
        let mut cube = ramp();
        cube.write(3, 2, 1, NULL).unwrap();
        assert!(is_null(Interpolator::BiLinear.interpolate(&cube, 2.5, 2.5, 1)));
        assert!(is_null(
            Interpolator::CubicConvolution.interpolate(&cube, 1.5, 1.5, 1)
        ));
        assert_eq!(
            Interpolator::NearestNeighbor.interpolate(&cube, 2.0, 2.0, 1),
            22.0
        );
    }

    #[test]
    fn test_special_tap_falls_back_to_nearest() {
        let mut cube = ramp();
        cube.write(3, 3, 1, HIS).unwrap();
        assert_eq!(Interpolator::BiLinear.interpolate(&cube, 2.2, 2.2, 1), 22.0);
    }

    #[test]
    fn test_names() {
        assert_eq!(
            "BILINEAR".parse::<Interpolator>().unwrap(),
            Interpolator::BiLinear
        );
        assert_eq!(Interpolator::NearestNeighbor.to_string(), "NearestNeighbor");
        assert!("lanczos".parse::<Interpolator>().is_err());
    }
}
