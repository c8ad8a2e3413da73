//! Geometric resampling engine
//!
//! [`RubberSheet`] drives a [`Transform`] over an output raster in one of two
//! ways:
//!
//! - [`RubberSheet::start_process`] walks the output in square tiles. Each
//!   tile's output-to-input map is built by quad-tree subdivision with a
//!   reverse transform (see the tiling hint below).
//! - [`RubberSheet::process_patch_transform`] walks the input in patches and
//!   pushes them forward with a forward transform.
//!
//! # Tiling
//!
//! A tiling hint `(start, end)` sets the tile size and the size below which
//! quads are transformed pixel by pixel. The hint `(2, 2)` turns the quad
//! tree off entirely.

mod patch;
mod quad;

use crate::error::{TransformError, TransformResult};
use crate::interpolator::Interpolator;
use crate::transform::Transform;
use cartos_core::pixel::NULL;
use cartos_core::{RasterView, TilingHint};
use quad::{QuadTreeBuilder, TileMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tile size used when the quad tree is off.
const SLOW_TILE_SIZE: usize = 16;

/// Layout of forward patches over the input.
///
/// Patches are `samples x lines` pixels, stepped `sample_increment` and
/// `line_increment` apart starting at `(start_sample, start_line)`. Steps
/// smaller than the patch size overlap neighbouring patches. `start_line`
/// may be zero or negative to align patches to framelet boundaries; patches
/// are clipped to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchParameters {
    pub start_sample: i64,
    pub start_line: i64,
    pub samples: usize,
    pub lines: usize,
    pub sample_increment: usize,
    pub line_increment: usize,
}

impl Default for PatchParameters {
    fn default() -> Self {
        Self {
            start_sample: 1,
            start_line: 1,
            samples: 5,
            lines: 5,
            sample_increment: 4,
            line_increment: 4,
        }
    }
}

impl PatchParameters {
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidParameters`] when a size or
    /// increment is zero.
    pub fn new(
        start_sample: i64,
        start_line: i64,
        samples: usize,
        lines: usize,
        sample_increment: usize,
        line_increment: usize,
    ) -> TransformResult<Self> {
        if samples == 0 || lines == 0 {
            return Err(TransformError::InvalidParameters(
                "Patch size must be at least one pixel".into(),
            ));
        }
        if sample_increment == 0 || line_increment == 0 {
            return Err(TransformError::InvalidParameters(
                "Patch increments must be positive".into(),
            ));
        }
        Ok(Self {
            start_sample,
            start_line,
            samples,
            lines,
            sample_increment,
            line_increment,
        })
    }
}

/// Resampler state: tiling, forced tile and patch layout.
#[derive(Debug, Clone, Default)]
pub struct RubberSheet {
    tiling: TilingHint,
    force: Option<(f64, f64)>,
    patch: PatchParameters,
}

impl RubberSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiling(mut self, tiling: TilingHint) -> Self {
        self.tiling = tiling;
        self
    }

    pub fn set_tiling(&mut self, tiling: TilingHint) {
        self.tiling = tiling;
    }

    pub fn tiling(&self) -> TilingHint {
        self.tiling
    }

    /// Always subdivide quads containing this output position, even when
    /// none of their probe points transform. Only one position is kept.
    pub fn force_tile(&mut self, sample: f64, line: f64) {
        self.force = Some((sample, line));
    }

    pub fn set_patch_parameters(&mut self, patch: PatchParameters) {
        self.patch = patch;
    }

    pub fn patch_parameters(&self) -> PatchParameters {
        self.patch
    }

    /// Fill `output` by walking it with a reverse (output to input)
    /// transform. Pixels with no input counterpart are written `NULL`.
    ///
    /// # Errors
    ///
    /// Propagates raster write failures.
    pub fn start_process(
        &self,
        transform: &mut dyn Transform,
        interpolator: Interpolator,
        input: &dyn RasterView,
        output: &mut dyn RasterView,
    ) -> TransformResult<()> {
        let slow = self.is_slow();
        let size = if slow {
            SLOW_TILE_SIZE
        } else {
            self.tiling.start
        };
        let (ons, onl, bands) = (output.samples(), output.lines(), output.bands());
        let (ins, inl) = (input.samples(), input.lines());
        let origins: Vec<(i64, i64)> = (0..onl.div_ceil(size))
            .flat_map(|ty| {
                (0..ons.div_ceil(size)).map(move |tx| ((tx * size + 1) as i64, (ty * size + 1) as i64))
            })
            .collect();
        debug!(
            tiles = origins.len(),
            size,
            slow,
            band_dependent = transform.is_band_dependent(),
            "rubber sheet"
        );

        if transform.is_band_dependent() {
            for band in 1..=bands {
                transform.band_change(band);
                for &origin in &origins {
                    let map = self.tile_map(transform, origin, size, (ins, inl));
                    fill_tile(&map, origin, size, interpolator, input, output, band)?;
                }
            }
        } else {
            for &origin in &origins {
                let map = self.tile_map(transform, origin, size, (ins, inl));
                for band in 1..=bands {
                    fill_tile(&map, origin, size, interpolator, input, output, band)?;
                }
            }
        }
        Ok(())
    }

    fn is_slow(&self) -> bool {
        self.tiling.start == 2 && self.tiling.end == 2
    }

    fn tile_map(
        &self,
        transform: &mut dyn Transform,
        (sample, line): (i64, i64),
        size: usize,
        (input_samples, input_lines): (usize, usize),
    ) -> TileMap {
        let mut builder = QuadTreeBuilder::new(
            transform,
            self.tiling.end,
            self.force,
            input_samples,
            input_lines,
        );
        if self.is_slow() {
            builder.slow_tile_map(sample, line, size)
        } else {
            builder.tile_map(sample, line, size)
        }
    }

    /// Fill `output` by pushing input patches through a forward (input to
    /// output) transform. `output` should start out `NULL`; pixels no patch
    /// reaches are left untouched.
    ///
    /// # Errors
    ///
    /// Propagates raster write failures.
    pub fn process_patch_transform(
        &self,
        transform: &mut dyn Transform,
        interpolator: Interpolator,
        input: &dyn RasterView,
        output: &mut dyn RasterView,
    ) -> TransformResult<()> {
        patch::process_patches(transform, interpolator, input, output, &self.patch)
    }
}

fn fill_tile(
    map: &TileMap,
    (first_sample, first_line): (i64, i64),
    size: usize,
    interpolator: Interpolator,
    input: &dyn RasterView,
    output: &mut dyn RasterView,
    band: usize,
) -> TransformResult<()> {
    let (ons, onl) = (output.samples(), output.lines());
    for dl in 0..size {
        let line = first_line as usize + dl;
        if line > onl {
            break;
        }
        for ds in 0..size {
            let sample = first_sample as usize + ds;
            if sample > ons {
                break;
            }
            let value = match map.get(ds, dl) {
                Some((is, il)) => interpolator.interpolate(input, is, il, band),
                None => NULL,
            };
            output.write(sample, line, band, value)?;
        }
    }
    Ok(())
}
