//! Forward patch resampling
//!
//! The input is cut into overlapping rectangular patches. The corners of
//! each patch go through a forward (input to output) transform; a bilinear
//! fit of the inverse through those four pairs then predicts, for every
//! output pixel under the patch footprint, where to read the input. Patches
//! whose corners do not all map, or whose footprint is implausibly large
//! (a longitude seam running through it), are cut in four and retried.

use super::PatchParameters;
use super::quad::BilinearFit;
use crate::error::TransformResult;
use crate::interpolator::Interpolator;
use crate::transform::Transform;
use cartos_core::RasterView;
use cartos_core::pixel::is_null;
use tracing::{debug, trace};

/// Inclusive input pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Patch {
    ssamp: i64,
    esamp: i64,
    sline: i64,
    eline: i64,
}

impl Patch {
    /// Children sharing their cut edge. An axis spanning fewer than three
    /// pixels is not cut.
    fn split(&self) -> Vec<Patch> {
        let cut = |start: i64, end: i64| {
            if end - start < 2 {
                vec![(start, end)]
            } else {
                let mid = (start + end) / 2;
                vec![(start, mid), (mid, end)]
            }
        };
        let mut children = Vec::with_capacity(4);
        for &(sline, eline) in &cut(self.sline, self.eline) {
            for &(ssamp, esamp) in &cut(self.ssamp, self.esamp) {
                children.push(Patch {
                    ssamp,
                    esamp,
                    sline,
                    eline,
                });
            }
        }
        children
    }

    fn is_minimal(&self) -> bool {
        self.esamp - self.ssamp < 2 && self.eline - self.sline < 2
    }

    fn covers(&self, sample: f64, line: f64) -> bool {
        sample >= self.ssamp as f64 - 0.5
            && sample <= self.esamp as f64 + 0.5
            && line >= self.sline as f64 - 0.5
            && line <= self.eline as f64 + 0.5
    }
}

/// A patch whose output footprint has been fitted.
#[derive(Debug, Clone)]
struct FittedPatch {
    patch: Patch,
    fit: BilinearFit,
    samples: (usize, usize),
    lines: (usize, usize),
}

/// Resample `input` into `output` by forward patches.
pub(crate) fn process_patches(
    transform: &mut dyn Transform,
    interpolator: Interpolator,
    input: &dyn RasterView,
    output: &mut dyn RasterView,
    params: &PatchParameters,
) -> TransformResult<()> {
    let bands = output.bands();
    if transform.is_band_dependent() {
        for band in 1..=bands {
            transform.band_change(band);
            let fitted = fit_patches(transform, input, params);
            write_patches(&fitted, interpolator, input, output, band)?;
        }
    } else {
        let fitted = fit_patches(transform, input, params);
        for band in 1..=bands {
            write_patches(&fitted, interpolator, input, output, band)?;
        }
    }
    Ok(())
}

fn fit_patches(
    transform: &mut dyn Transform,
    input: &dyn RasterView,
    params: &PatchParameters,
) -> Vec<FittedPatch> {
    let (ns, nl) = (input.samples() as i64, input.lines() as i64);
    let mut stack = Vec::new();
    let mut line = params.start_line;
    while line <= nl {
        let mut sample = params.start_sample;
        while sample <= ns {
            let patch = Patch {
                ssamp: sample.max(1),
                esamp: (sample + params.samples as i64 - 1).min(ns),
                sline: line.max(1),
                eline: (line + params.lines as i64 - 1).min(nl),
            };
            if patch.ssamp <= patch.esamp && patch.sline <= patch.eline {
                stack.push(patch);
            }
            sample += params.sample_increment as i64;
        }
        line += params.line_increment as i64;
    }
    stack.reverse();

    let initial = stack.len();
    let mut fitted = Vec::with_capacity(initial);
    let mut dropped = 0usize;
    while let Some(patch) = stack.pop() {
        match fit_patch(transform, &patch) {
            Some(f) => fitted.push(f),
            None if patch.is_minimal() => {
                trace!(?patch, "patch does not map");
                dropped += 1;
            }
            None => stack.extend(patch.split().into_iter().rev()),
        }
    }
    debug!(initial, fitted = fitted.len(), dropped, "forward patches");
    fitted
}

fn fit_patch(transform: &mut dyn Transform, patch: &Patch) -> Option<FittedPatch> {
    let inputs = [
        (patch.ssamp as f64, patch.sline as f64),
        (patch.esamp as f64, patch.sline as f64),
        (patch.ssamp as f64, patch.eline as f64),
        (patch.esamp as f64, patch.eline as f64),
    ];
    let mut outputs = [(0.0, 0.0); 4];
    for (out, &(s, l)) in outputs.iter_mut().zip(&inputs) {
        *out = transform.xform(s, l)?;
    }

    let (ons, onl) = (transform.output_samples(), transform.output_lines());
    let (min_s, max_s) = extent(outputs.map(|(s, _)| s));
    let (min_l, max_l) = extent(outputs.map(|(_, l)| l));
    if max_s - min_s > ons as f64 / 2.0 || max_l - min_l > onl as f64 / 2.0 {
        trace!(?patch, "patch footprint too large");
        return None;
    }

    let fit = BilinearFit::solve_f64(&outputs, &inputs)?;
    let samples = pixel_span(min_s, max_s, ons)?;
    let lines = pixel_span(min_l, max_l, onl)?;
    Some(FittedPatch {
        patch: *patch,
        fit,
        samples,
        lines,
    })
}

fn extent(values: [f64; 4]) -> (f64, f64) {
    values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Output pixels within a pixel of `[min, max]`, clipped to `1..=size`.
fn pixel_span(min: f64, max: f64, size: usize) -> Option<(usize, usize)> {
    let first = (min - 1.0).floor().max(1.0);
    let last = (max + 1.0).ceil().min(size as f64);
    (first <= last).then_some((first as usize, last as usize))
}

fn write_patches(
    fitted: &[FittedPatch],
    interpolator: Interpolator,
    input: &dyn RasterView,
    output: &mut dyn RasterView,
    band: usize,
) -> TransformResult<()> {
    for f in fitted {
        for line in f.lines.0..=f.lines.1 {
            for sample in f.samples.0..=f.samples.1 {
                let (is, il) = f.fit.apply(sample as f64, line as f64);
                if !f.patch.covers(is, il) {
                    continue;
                }
                let value = interpolator.interpolate(input, is, il, band);
                // Never clobber a neighbouring patch with NULL
                if !is_null(value) {
                    output.write(sample, line, band, value)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::Cube;
    use cartos_core::pixel::NULL;

    /// `out = (in_s + 2, in_l + 1)` on a 12x12 output.
    struct Offset;

    impl Transform for Offset {
        fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)> {
            Some((sample + 2.0, line + 1.0))
        }
        fn output_samples(&self) -> usize {
            12
        }
        fn output_lines(&self) -> usize {
            12
        }
    }

    /// Swaps halves: input sample `s` goes to `s + 5` for `s <= 5`, else
    /// `s - 5`.
    struct Rolled;

    impl Transform for Rolled {
        fn xform(&mut self, sample: f64, line: f64) -> Option<(f64, f64)> {
            let s = if sample <= 5.0 { sample + 5.0 } else { sample - 5.0 };
            Some((s, line))
        }
        fn output_samples(&self) -> usize {
            10
        }
        fn output_lines(&self) -> usize {
            10
        }
    }

    fn ramp(ns: usize, nl: usize) -> Cube {
        let data = (0..ns * nl).map(|i| i as f64).collect();
        Cube::from_data(ns, nl, 1, data).unwrap()
    }

    #[test]
    fn test_split_shrinks() {
        let p = Patch {
            ssamp: 1,
            esamp: 5,
            sline: 1,
            eline: 2,
        };
        let children = p.split();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.esamp - c.ssamp < 4));
        assert!(children.iter().all(|c| c.sline == 1 && c.eline == 2));
    }

    #[test]
    fn test_offset_copies_input() {
        let input = ramp(10, 10);
        let mut output = Cube::new(12, 12, 1).unwrap();
        process_patches(
            &mut Offset,
            Interpolator::NearestNeighbor,
            &input,
            &mut output,
            &PatchParameters::default(),
        )
        .unwrap();
        for line in 1..=10 {
            for sample in 1..=10 {
                assert_eq!(
                    output.read(sample + 2, line + 1, 1),
                    input.read(sample, line, 1),
                    "input ({sample}, {line})"
                );
            }
        }
        assert_eq!(output.read(1, 1, 1), NULL);
        assert_eq!(output.read(12, 12, 1), NULL);
    }

    #[test]
    fn test_seam_patches_are_split() {
        let input = ramp(10, 10);
        let mut output = Cube::new(10, 10, 1).unwrap();
        process_patches(
            &mut Rolled,
            Interpolator::NearestNeighbor,
            &input,
            &mut output,
            &PatchParameters::default(),
        )
        .unwrap();
        for line in 1..=10 {
            assert_eq!(output.read(6, line, 1), input.read(1, line, 1));
            assert_eq!(output.read(5, line, 1), input.read(10, line, 1));
            assert_eq!(output.read(2, line, 1), input.read(7, line, 1));
        }
    }
}
