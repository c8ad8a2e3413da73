//! Image footprints
//!
//! [`ImagePolygon`] traces the outline of the part of an image that sees
//! the target:
//!
//! 1. Sample the image on a grid of `(sample, line)` points. A point is
//!    valid when it lies inside the image, the camera intersects the target
//!    there, and the emission and incidence angles are within limits.
//! 2. Walk the boundary of the valid points clockwise (Moore neighbour
//!    tracing over 8-connected grid cells).
//! 3. Push every boundary point outwards by bisection until it sits on the
//!    edge of the valid region.
//! 4. Convert to universal `(lon, lat)`, detour over a pole the image
//!    contains, and split at the 0/360 seam.
//!
//! The result is stored in the cube as a `Polygon` blob named `Footprint`
//! holding `MULTIPOLYGON` WKT.

use crate::despike::despike;
use crate::error::{GeometryError, GeometryResult};
use crate::seam::split_360;
use crate::validity::is_valid;
use crate::wkt::{from_wkt, to_wkt};
use cartos_core::{Blob, Camera, RasterView};
use geo::{Coord, LineString, MultiPolygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Blob name of a stored footprint.
pub const FOOTPRINT_BLOB_NAME: &str = "Footprint";

/// Blob type of a stored footprint.
pub const FOOTPRINT_BLOB_KIND: &str = "Polygon";

/// Spacing of the traced grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Increment {
    /// Explicit sample and line spacing
    SampleLine { sinc: usize, linc: usize },
    /// Spacing chosen so the image perimeter gives about this many vertices
    Vertices(usize),
}

impl Default for Increment {
    fn default() -> Self {
        Self::SampleLine { sinc: 1, linc: 1 }
    }
}

impl Increment {
    fn resolve(self, samples: usize, lines: usize) -> GeometryResult<(usize, usize)> {
        match self {
            Increment::SampleLine { sinc, linc } => {
                if sinc < 1 || linc < 1 {
                    return Err(GeometryError::Footprint(format!(
                        "Sample and line increments must be at least 1, got [{sinc}] and [{linc}]"
                    )));
                }
                Ok((sinc, linc))
            }
            Increment::Vertices(count) => {
                if count < 3 {
                    return Err(GeometryError::Footprint(format!(
                        "A footprint needs at least 3 vertices, got [{count}]"
                    )));
                }
                let inc = (2 * (samples + lines) / count).max(1);
                Ok((inc, inc))
            }
        }
    }
}

/// Footprint computation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintOptions {
    pub increment: Increment,
    /// Degrees; points seen at a larger emission angle are invalid
    pub max_emission: f64,
    /// Degrees; points lit at a larger incidence angle are invalid
    pub max_incidence: f64,
    /// Bisection steps used to push boundary points onto the edge
    pub subpixel_accuracy: u32,
    /// Retry with finer increments when tracing fails
    pub increase_precision: bool,
    /// Band used for band-dependent cameras
    pub band: usize,
}

impl Default for FootprintOptions {
    fn default() -> Self {
        Self {
            increment: Increment::default(),
            max_emission: 180.0,
            max_incidence: 180.0,
            subpixel_accuracy: 50,
            increase_precision: false,
            band: 1,
        }
    }
}

/// Trace direction (8-connected, clockwise from West with lines growing
/// downwards)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    West = 0,
    NorthWest = 1,
    North = 2,
    NorthEast = 3,
    East = 4,
    SouthEast = 5,
    South = 6,
    SouthWest = 7,
}

const XPOSTAB: [i64; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];
const YPOSTAB: [i64; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

/// DIRTAB[1+dy][1+dx] gives the direction index
const DIRTAB: [[i32; 3]; 3] = [[1, 2, 3], [0, -1, 4], [7, 6, 5]];

impl Direction {
    fn dx(self) -> i64 {
        XPOSTAB[self as usize]
    }

    fn dy(self) -> i64 {
        YPOSTAB[self as usize]
    }

    fn from_offset(dx: i64, dy: i64) -> Option<Self> {
        if dx.abs() > 1 || dy.abs() > 1 {
            return None;
        }
        let idx = DIRTAB[(1 + dy) as usize][(1 + dx) as usize];
        if idx < 0 {
            None
        } else {
            Some(Self::from_index(idx as usize))
        }
    }

    fn from_index(idx: usize) -> Self {
        match idx % 8 {
            0 => Direction::West,
            1 => Direction::NorthWest,
            2 => Direction::North,
            3 => Direction::NorthEast,
            4 => Direction::East,
            5 => Direction::SouthEast,
            6 => Direction::South,
            _ => Direction::SouthWest,
        }
    }

    /// Direction `steps` eighth-turns clockwise from this one.
    fn clockwise(self, steps: usize) -> Self {
        Self::from_index(self as usize + steps)
    }
}

type Cell = (i64, i64);

/// Footprint generator for one camera.
#[derive(Debug, Clone, Default)]
pub struct ImagePolygon {
    options: FootprintOptions,
}

impl ImagePolygon {
    pub fn new(options: FootprintOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FootprintOptions {
        &self.options
    }

    /// Compute the `(lon, lat)` footprint seen by `camera`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Footprint`] when fewer than three boundary
    /// points are found, when the image contains both poles, or for
    /// invalid increments.
    pub fn compute(&self, camera: &mut dyn Camera) -> GeometryResult<MultiPolygon<f64>> {
        self.compute_named(camera, "image")
    }

    /// Compute the footprint of `cube` and store it as its footprint blob.
    ///
    /// # Errors
    ///
    /// See [`ImagePolygon::compute`]; storing the blob may also fail.
    pub fn compute_for_cube(
        &self,
        camera: &mut dyn Camera,
        cube: &mut dyn RasterView,
    ) -> GeometryResult<MultiPolygon<f64>> {
        let name = cube.file_name().to_string();
        let footprint = self.compute_named(camera, &name)?;
        write_footprint(cube, &footprint)?;
        Ok(footprint)
    }

    fn compute_named(&self, camera: &mut dyn Camera, name: &str) -> GeometryResult<MultiPolygon<f64>> {
        if !camera.is_band_independent() {
            camera.set_band(self.options.band);
        }
        let (mut sinc, mut linc) = self
            .options
            .increment
            .resolve(camera.samples(), camera.lines())?;

        loop {
            match self.trace(camera, sinc, linc) {
                Ok(footprint) => return Ok(footprint),
                Err(e) if self.options.increase_precision && (sinc > 1 || linc > 1) => {
                    sinc = (sinc * 2 / 3).max(1);
                    linc = (linc * 2 / 3).max(1);
                    debug!(%e, sinc, linc, "retrying footprint with finer increments");
                }
                Err(GeometryError::Footprint(message)) => {
                    return Err(GeometryError::Footprint(format!(
                        "Cannot find polygon for image [{name}]: {message}"
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn trace(&self, camera: &mut dyn Camera, sinc: usize, linc: usize) -> GeometryResult<MultiPolygon<f64>> {
        let (ns, nl) = (camera.samples(), camera.lines());
        let samples = axis(ns, sinc);
        let lines = axis(nl, linc);
        let mut grid = Grid {
            options: &self.options,
            cache: vec![None; samples.len() * lines.len()],
            samples,
            lines,
        };

        let cells = grid.boundary(camera);
        if cells.len() < 4 {
            return Err(GeometryError::Footprint(
                "Failed to find enough points on the image".to_string(),
            ));
        }
        let points: Vec<Coord<f64>> = cells
            .iter()
            .map(|&(c, r)| Coord {
                x: grid.samples[c as usize],
                y: grid.lines[r as usize],
            })
            .collect();
        debug!(points = points.len() - 1, sinc, linc, "traced footprint boundary");

        // Largest spacing actually present in the grid
        let max_step = sinc
            .min(ns.saturating_sub(1))
            .max(linc.min(nl.saturating_sub(1)))
            .max(1) as f64;
        let refined = self.refine(camera, &points, max_step);

        let mut ring: Vec<Coord<f64>> = Vec::with_capacity(refined.len());
        let mut crossings = Vec::new();
        for p in &refined {
            if !camera.set_image(p.x, p.y) {
                return Err(GeometryError::Footprint(format!(
                    "Boundary point ({}, {}) no longer intersects the target",
                    p.x, p.y
                )));
            }
            let lonlat = Coord {
                x: camera.universal_longitude(),
                y: camera.universal_latitude(),
            };
            if ring.last().is_some_and(|prev| (lonlat.x - prev.x).abs() >= 180.0) {
                crossings.push(ring.len() - 1);
            }
            ring.push(lonlat);
        }

        self.detour_pole(camera, &mut ring, &crossings)?;
        ring.dedup();

        let footprint = split_360(&LineString::new(ring))?;
        if footprint.0.is_empty() {
            return Err(GeometryError::Footprint("Traced footprint has no area".to_string()));
        }
        if is_valid(&footprint) {
            Ok(footprint)
        } else {
            despike(&footprint).map_err(|e| GeometryError::Footprint(e.to_string()))
        }
    }

    /// Move each boundary point outwards until it sits on the edge of the
    /// valid region. The outward direction is the normal of the chord
    /// between its neighbours.
    fn refine(&self, camera: &mut dyn Camera, points: &[Coord<f64>], max_step: f64) -> Vec<Coord<f64>> {
        let open = &points[..points.len() - 1];
        let n = open.len();
        let mut refined = Vec::with_capacity(n + 1);
        for i in 0..n {
            let pt = open[i];
            let old = open[(i + n - 1) % n];
            let next = open[(i + 1) % n];
            let step_x = (next.y - old.y) / max_step;
            let step_y = (old.x - next.x) / max_step;

            let mut valid = pt;
            let mut invalid = Coord {
                x: pt.x + step_x,
                y: pt.y + step_y,
            };
            for _ in 0..self.options.subpixel_accuracy {
                let mid = Coord {
                    x: (valid.x + invalid.x) / 2.0,
                    y: (valid.y + invalid.y) / 2.0,
                };
                if valid_point(&self.options, camera, mid.x, mid.y) {
                    valid = mid;
                } else {
                    invalid = mid;
                }
            }
            refined.push(valid);
        }
        refined.push(refined[0]);
        refined
    }

    /// True when `lat` (±90) projects inside the image at a valid point.
    fn pole_in_image(&self, camera: &mut dyn Camera, lat: f64) -> bool {
        if !camera.set_universal_ground(lat, 0.0) || !camera.in_image() {
            return false;
        }
        let (s, l) = (camera.sample(), camera.line());
        valid_point(&self.options, camera, s, l)
    }

    /// Route the ring over the pole at the seam crossing closest to it.
    fn detour_pole(
        &self,
        camera: &mut dyn Camera,
        ring: &mut Vec<Coord<f64>>,
        crossings: &[usize],
    ) -> GeometryResult<()> {
        let north = self.pole_in_image(camera, 90.0);
        let south = self.pole_in_image(camera, -90.0);
        if north && south {
            return Err(GeometryError::Footprint(
                "Unable to create image footprint because image has both poles".to_string(),
            ));
        }
        if crossings.is_empty() {
            return Ok(());
        }
        let pole = if north {
            90.0
        } else if south {
            -90.0
        } else if crossings.len() % 2 == 1 {
            // The image wraps around a pole it does not see
            let mean = ring.iter().map(|c| c.y).sum::<f64>() / ring.len() as f64;
            if mean >= 0.0 { 90.0 } else { -90.0 }
        } else {
            return Ok(());
        };

        let Some(&at) = crossings
            .iter()
            .min_by(|&&a, &&b| (pole - ring[a].y).abs().total_cmp(&(pole - ring[b].y).abs()))
        else {
            return Ok(());
        };
        let prev = ring[at];
        let next = ring[at + 1];
        let seam = if prev.x < 180.0 { 0.0 } else { 360.0 };
        let next_lon = if next.x - prev.x > 180.0 {
            next.x - 360.0
        } else if next.x - prev.x < -180.0 {
            next.x + 360.0
        } else {
            next.x
        };
        let t = if next_lon == prev.x {
            0.0
        } else {
            (seam - prev.x) / (next_lon - prev.x)
        };
        let lat_cross = prev.y + t * (next.y - prev.y);
        let other = 360.0 - seam;
        let detour = [
            Coord { x: seam, y: lat_cross },
            Coord { x: seam, y: pole },
            Coord { x: other, y: pole },
            Coord { x: other, y: lat_cross },
        ];
        ring.splice(at + 1..at + 1, detour);
        debug!(pole, lat_cross, "footprint routed over pole");
        Ok(())
    }
}

fn valid_point(options: &FootprintOptions, camera: &mut dyn Camera, sample: f64, line: f64) -> bool {
    let ns = camera.samples() as f64;
    let nl = camera.lines() as f64;
    sample >= 0.5
        && line >= 0.5
        && sample <= ns + 0.5
        && line <= nl + 0.5
        && camera.set_image(sample, line)
        && camera.emission_angle() <= options.max_emission
        && camera.incidence_angle() <= options.max_incidence
}

/// Grid positions `1, 1 + inc, ...`, always ending on `count`.
fn axis(count: usize, inc: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let mut positions: Vec<f64> = (1..=count).step_by(inc.max(1)).map(|i| i as f64).collect();
    if positions.last() != Some(&(count as f64)) {
        positions.push(count as f64);
    }
    positions
}

struct Grid<'a> {
    options: &'a FootprintOptions,
    samples: Vec<f64>,
    lines: Vec<f64>,
    cache: Vec<Option<bool>>,
}

impl Grid<'_> {
    fn valid(&mut self, camera: &mut dyn Camera, (c, r): Cell) -> bool {
        if c < 0 || r < 0 || c as usize >= self.samples.len() || r as usize >= self.lines.len() {
            return false;
        }
        let idx = r as usize * self.samples.len() + c as usize;
        if let Some(v) = self.cache[idx] {
            return v;
        }
        let v = valid_point(self.options, camera, self.samples[c as usize], self.lines[r as usize]);
        self.cache[idx] = Some(v);
        v
    }

    /// Closed list of boundary cells, starting at the first valid cell in
    /// raster order.
    fn boundary(&mut self, camera: &mut dyn Camera) -> Vec<Cell> {
        let cols = self.samples.len() as i64;
        let rows = self.lines.len() as i64;
        let mut start = None;
        'scan: for r in 0..rows {
            for c in 0..cols {
                if self.valid(camera, (c, r)) {
                    start = Some((c, r));
                    break 'scan;
                }
            }
        }
        let Some(start) = start else {
            return Vec::new();
        };

        let mut cells = vec![start];
        let mut current = start;
        // Everything west of and above the start cell is invalid
        let mut backtrack = Direction::West;
        let limit = 4 * (cols * rows) as usize + 8;
        for _ in 0..limit {
            let Some((next, from)) = self.next_boundary(camera, current, backtrack) else {
                break;
            };
            if current == start && cells.len() > 1 && next == cells[1] {
                break;
            }
            cells.push(next);
            current = next;
            backtrack = from;
        }
        cells
    }

    /// Next boundary cell clockwise around `p`, and the direction from it
    /// back to the last invalid cell examined.
    fn next_boundary(
        &mut self,
        camera: &mut dyn Camera,
        p: Cell,
        backtrack: Direction,
    ) -> Option<(Cell, Direction)> {
        let mut examined = backtrack;
        for steps in 1..=8 {
            let d = backtrack.clockwise(steps);
            let q = (p.0 + d.dx(), p.1 + d.dy());
            if self.valid(camera, q) {
                let b = (p.0 + examined.dx(), p.1 + examined.dy());
                let from = Direction::from_offset(b.0 - q.0, b.1 - q.1)?;
                return Some((q, from));
            }
            examined = d;
        }
        None
    }
}

/// Store a footprint in the cube's `Footprint` blob.
///
/// # Errors
///
/// Returns the cube's error when it cannot store blobs.
pub fn write_footprint(cube: &mut dyn RasterView, footprint: &MultiPolygon<f64>) -> GeometryResult<()> {
    let blob = Blob::new(FOOTPRINT_BLOB_KIND, FOOTPRINT_BLOB_NAME, to_wkt(footprint).into_bytes());
    cube.put_blob(blob)?;
    Ok(())
}

/// Read the footprint stored in a cube.
///
/// # Errors
///
/// Returns [`GeometryError::Footprint`] when the cube has no footprint
/// blob, and [`GeometryError::Wkt`] when the blob is not valid WKT.
pub fn read_footprint(cube: &dyn RasterView) -> GeometryResult<MultiPolygon<f64>> {
    let Some(blob) = cube.blob(FOOTPRINT_BLOB_KIND, FOOTPRINT_BLOB_NAME) else {
        return Err(GeometryError::Footprint(format!(
            "Cube [{}] has no footprint; compute one first",
            cube.file_name()
        )));
    };
    let text = std::str::from_utf8(&blob.data).map_err(|e| GeometryError::Wkt {
        offset: e.valid_up_to(),
        message: "footprint blob is not UTF-8".to_string(),
    })?;
    from_wkt(text)
}
