//! Quad-tree construction of output-to-input tile maps
//!
//! For one output tile the four quad corners are sent through the reverse
//! transform. When they all land and a bilinear fit through them predicts
//! the quad midpoint within half a pixel, the fit fills the whole quad.
//! Otherwise the quad is split in four, down to the end size, below which
//! every pixel is transformed on its own.

use crate::transform::{Transform, in_raster};
use std::collections::VecDeque;
use tracing::trace;

/// Largest disagreement, pixels, between the fitted and the transformed
/// quad midpoint.
const MIDPOINT_TOLERANCE: f64 = 0.5;

/// Spacing of the probe points along quad edges and centre lines.
const PROBE_INCREMENT: usize = 4;

/// Output-to-input positions for one square output tile.
#[derive(Debug, Clone)]
pub(crate) struct TileMap {
    size: usize,
    map: Vec<Option<(f64, f64)>>,
}

impl TileMap {
    fn new(size: usize) -> Self {
        Self {
            size,
            map: vec![None; size * size],
        }
    }

    /// Input position for tile offset `(ds, dl)`, zero based.
    pub(crate) fn get(&self, ds: usize, dl: usize) -> Option<(f64, f64)> {
        self.map[dl * self.size + ds]
    }

    fn set(&mut self, ds: usize, dl: usize, value: Option<(f64, f64)>) {
        self.map[dl * self.size + ds] = value;
    }
}

/// Inclusive output pixel rectangle.
#[derive(Debug, Clone, Copy)]
struct Quad {
    ssamp: i64,
    esamp: i64,
    sline: i64,
    eline: i64,
}

impl Quad {
    fn height(&self) -> i64 {
        self.eline - self.sline
    }

    fn contains(&self, sample: f64, line: f64) -> bool {
        sample >= self.ssamp as f64
            && sample <= self.esamp as f64
            && line >= self.sline as f64
            && line <= self.eline as f64
    }

    fn split(&self) -> [Quad; 4] {
        let n = (self.eline - self.sline + 1) / 2;
        [
            Quad {
                ssamp: self.ssamp,
                esamp: self.ssamp + n - 1,
                sline: self.sline,
                eline: self.sline + n - 1,
            },
            Quad {
                ssamp: self.ssamp + n,
                esamp: self.esamp,
                sline: self.sline,
                eline: self.sline + n - 1,
            },
            Quad {
                ssamp: self.ssamp,
                esamp: self.ssamp + n - 1,
                sline: self.sline + n,
                eline: self.eline,
            },
            Quad {
                ssamp: self.ssamp + n,
                esamp: self.esamp,
                sline: self.sline + n,
                eline: self.eline,
            },
        ]
    }
}

/// Builds tile maps for one transform.
pub(crate) struct QuadTreeBuilder<'t> {
    transform: &'t mut dyn Transform,
    end_size: i64,
    force: Option<(f64, f64)>,
    input_samples: usize,
    input_lines: usize,
}

impl<'t> QuadTreeBuilder<'t> {
    pub(crate) fn new(
        transform: &'t mut dyn Transform,
        end_size: usize,
        force: Option<(f64, f64)>,
        input_samples: usize,
        input_lines: usize,
    ) -> Self {
        Self {
            transform,
            end_size: end_size as i64,
            force,
            input_samples,
            input_lines,
        }
    }

    /// Map of the `size x size` tile whose upper-left pixel is
    /// `(first_sample, first_line)`.
    pub(crate) fn tile_map(&mut self, first_sample: i64, first_line: i64, size: usize) -> TileMap {
        let mut tile = TileMap::new(size);
        let mut queue = VecDeque::from([Quad {
            ssamp: first_sample,
            esamp: first_sample + size as i64 - 1,
            sline: first_line,
            eline: first_line + size as i64 - 1,
        }]);
        while let Some(quad) = queue.pop_front() {
            self.process(quad, first_sample, first_line, &mut tile, &mut queue);
        }
        tile
    }

    /// Transform every pixel of a tile individually.
    pub(crate) fn slow_tile_map(
        &mut self,
        first_sample: i64,
        first_line: i64,
        size: usize,
    ) -> TileMap {
        let mut tile = TileMap::new(size);
        let quad = Quad {
            ssamp: first_sample,
            esamp: first_sample + size as i64 - 1,
            sline: first_line,
            eline: first_line + size as i64 - 1,
        };
        self.slow_quad(quad, first_sample, first_line, &mut tile);
        tile
    }

    fn xform(&mut self, sample: i64, line: i64) -> Option<(f64, f64)> {
        self.transform.xform(sample as f64, line as f64)
    }

    fn process(
        &mut self,
        quad: Quad,
        tile_sample: i64,
        tile_line: i64,
        tile: &mut TileMap,
        queue: &mut VecDeque<Quad>,
    ) {
        let small = quad.height() < self.end_size;
        let outputs = [
            (quad.ssamp, quad.sline),
            (quad.esamp, quad.sline),
            (quad.ssamp, quad.eline),
            (quad.esamp, quad.eline),
        ];
        let inputs = outputs.map(|(s, l)| self.xform(s, l));
        let bad = inputs.iter().filter(|i| i.is_none()).count();

        if bad == 4 {
            if small {
                self.slow_quad(quad, tile_sample, tile_line, tile);
                return;
            }
            let forced = self.force.is_some_and(|(s, l)| quad.contains(s, l));
            if forced || self.probe(quad) {
                trace!(?quad, forced, "corners missed, interior hits: split");
                queue.extend(quad.split());
                return;
            }
            trace!(?quad, "quad misses the input");
            for l in quad.sline..=quad.eline {
                for s in quad.ssamp..=quad.esamp {
                    tile.set((s - tile_sample) as usize, (l - tile_line) as usize, None);
                }
            }
            return;
        }

        let fallback = |builder: &mut Self, tile: &mut TileMap, queue: &mut VecDeque<Quad>| {
            if small {
                builder.slow_quad(quad, tile_sample, tile_line, tile);
            } else {
                queue.extend(quad.split());
            }
        };

        let [Some(i0), Some(i1), Some(i2), Some(i3)] = inputs else {
            fallback(self, tile, queue);
            return;
        };
        let Some(fit) = BilinearFit::solve(&outputs, &[i0, i1, i2, i3]) else {
            fallback(self, tile, queue);
            return;
        };

        let mid_sample = (quad.ssamp + quad.esamp) as f64 / 2.0;
        let mid_line = (quad.sline + quad.eline) as f64 / 2.0;
        let Some((ms, ml)) = self.transform.xform(mid_sample, mid_line) else {
            fallback(self, tile, queue);
            return;
        };
        let (ps, pl) = fit.apply(mid_sample, mid_line);
        if (ps - ms).abs() > MIDPOINT_TOLERANCE || (pl - ml).abs() > MIDPOINT_TOLERANCE {
            trace!(?quad, "bilinear fit off at midpoint");
            fallback(self, tile, queue);
            return;
        }

        for l in quad.sline..=quad.eline {
            for s in quad.ssamp..=quad.esamp {
                let position = fit.apply(s as f64, l as f64);
                tile.set(
                    (s - tile_sample) as usize,
                    (l - tile_line) as usize,
                    Some(position),
                );
            }
        }
    }

    fn slow_quad(&mut self, quad: Quad, tile_sample: i64, tile_line: i64, tile: &mut TileMap) {
        for l in quad.sline..=quad.eline {
            for s in quad.ssamp..=quad.esamp {
                let position = self
                    .xform(s, l)
                    .filter(|&(is, il)| in_raster(is, il, self.input_samples, self.input_lines));
                tile.set(
                    (s - tile_sample) as usize,
                    (l - tile_line) as usize,
                    position,
                );
            }
        }
    }

    /// Look for any transformable pixel along the quad's edges and centre
    /// lines.
    fn probe(&mut self, quad: Quad) -> bool {
        let cs = (quad.ssamp + quad.esamp) / 2;
        let cl = (quad.sline + quad.eline) / 2;
        let lines = [
            (quad.ssamp + 1, quad.esamp - 1, quad.sline, quad.sline),
            (quad.ssamp + 1, quad.esamp - 1, quad.eline, quad.eline),
            (quad.ssamp, quad.ssamp, quad.sline + 1, quad.eline - 1),
            (quad.esamp, quad.esamp, quad.sline + 1, quad.eline - 1),
            (cs, cs, quad.sline + 1, quad.eline - 1),
            (quad.ssamp + 1, quad.esamp - 1, cl, cl),
        ];
        lines
            .into_iter()
            .any(|(ss, es, sl, el)| self.test_line(ss, es, sl, el))
    }

    fn test_line(&mut self, ssamp: i64, esamp: i64, sline: i64, eline: i64) -> bool {
        for l in (sline..=eline).step_by(PROBE_INCREMENT) {
            for s in (ssamp..=esamp).step_by(PROBE_INCREMENT) {
                if self.xform(s, l).is_some() {
                    return true;
                }
            }
        }
        false
    }
}

/// `input = c0 * line + c1 * sample + c2 * line * sample + c3`, one set of
/// coefficients per input axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BilinearFit {
    line: [f64; 4],
    sample: [f64; 4],
}

impl BilinearFit {
    /// Fit through four `(sample, line)` to `(sample, line)` pairs by
    /// Cramer's rule. `None` when the output points are degenerate.
    pub(crate) fn solve(outputs: &[(i64, i64); 4], inputs: &[(f64, f64); 4]) -> Option<Self> {
        let mut a = [[0.0; 4]; 4];
        for (row, &(s, l)) in a.iter_mut().zip(outputs) {
            let (s, l) = (s as f64, l as f64);
            *row = [l, s, l * s, 1.0];
        }
        Self::solve_matrix(a, inputs)
    }

    /// As [`solve`](Self::solve) with fractional output points.
    pub(crate) fn solve_f64(outputs: &[(f64, f64); 4], inputs: &[(f64, f64); 4]) -> Option<Self> {
        let mut a = [[0.0; 4]; 4];
        for (row, &(s, l)) in a.iter_mut().zip(outputs) {
            *row = [l, s, l * s, 1.0];
        }
        Self::solve_matrix(a, inputs)
    }

    fn solve_matrix(a: [[f64; 4]; 4], inputs: &[(f64, f64); 4]) -> Option<Self> {
        let det = det4(&a);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let coefficients = |rhs: [f64; 4]| {
            let mut c = [0.0; 4];
            for (j, cj) in c.iter_mut().enumerate() {
                let mut b = a;
                for (row, value) in b.iter_mut().zip(rhs) {
                    row[j] = value;
                }
                *cj = det4(&b) / det;
            }
            c
        };
        Some(Self {
            line: coefficients(inputs.map(|(_, l)| l)),
            sample: coefficients(inputs.map(|(s, _)| s)),
        })
    }

    /// Predicted input `(sample, line)` for an output position.
    pub(crate) fn apply(&self, sample: f64, line: f64) -> (f64, f64) {
        let eval = |c: &[f64; 4]| c[0] * line + c[1] * sample + c[2] * line * sample + c[3];
        (eval(&self.sample), eval(&self.line))
    }
}

fn det3(m: [[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Cofactor expansion along the first row.
fn det4(m: &[[f64; 4]; 4]) -> f64 {
    let minor = |skip: usize| {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in m[1..].iter().enumerate() {
            let mut c = 0;
            for (k, value) in row.iter().enumerate() {
                if k != skip {
                    out[r][c] = *value;
                    c += 1;
                }
            }
        }
        det3(out)
    };
    m[0][0] * minor(0) - m[0][1] * minor(1) + m[0][2] * minor(2) - m[0][3] * minor(3)
}
