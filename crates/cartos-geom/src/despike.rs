//! Spike removal
//!
//! Set operations and coordinate conversions leave narrow spikes: a vertex
//! that runs out and back along almost the same line. Despiking walks each
//! ring and drops the middle vertex of every spiked triple, stepping back
//! two vertices after each removal so the new neighbours are re-examined.
//!
//! ```text
//!   (spiked)        (kept)          (kept)
//!   1               1               1-2
//!   |               |                 |
//! 3-|               |                 |
//!   |               |                 |
//!   2               2-3               3
//! ```

use crate::error::{GeometryError, GeometryResult};
use crate::fix::fix_ring;
use crate::ops::area;
use crate::validity::{is_valid, is_valid_polygon, is_valid_ring, point_segment_distance};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use tracing::debug;

/// Triangles smaller than this are treated as a straight line.
const MIN_TRIANGLE_AREA: f64 = 1.0e-10;

/// Largest height/side ratio of a spike.
const SPIKE_RATIO: f64 = 0.05;

/// Largest allowed area change, as a fraction of the input area.
const MAX_AREA_CHANGE: f64 = 0.5;

/// True when `middle` is a spike between `first` and `last`, tested in
/// both directions.
pub fn is_spiked(first: Coord<f64>, middle: Coord<f64>, last: Coord<f64>) -> bool {
    test_spiked(first, middle, last) || test_spiked(last, middle, first)
}

fn test_spiked(first: Coord<f64>, middle: Coord<f64>, last: Coord<f64>) -> bool {
    let base = (middle.x - first.x).hypot(middle.y - first.y);
    let tolerance = base / 100.0;

    let last_middle = (last.x - middle.x).hypot(last.y - middle.y);
    if last_middle == 0.0 {
        return true;
    }
    let last_line = point_segment_distance(last, first, middle);

    let mut spiked = last_line / last_middle < SPIKE_RATIO && last_line <= tolerance;
    if !spiked {
        let doubled = (middle.x - first.x) * (last.y - first.y) - (last.x - first.x) * (middle.y - first.y);
        if doubled.abs() / 2.0 < MIN_TRIANGLE_AREA {
            spiked = true;
        }
    }
    spiked
}

/// Remove spikes from a closed ring.
///
/// Returns an empty ring when fewer than three vertices survive.
pub fn despike_ring(ring: &LineString<f64>) -> LineString<f64> {
    let coords = &ring.0;
    if coords.len() < 4 {
        return LineString::new(vec![]);
    }
    // Drop the closing duplicate; a spike can sit on it
    let mut vertices: Vec<Coord<f64>> = coords[..coords.len() - 1].to_vec();

    let mut index: i64 = 0;
    while index < vertices.len() as i64 {
        if vertices.len() < 3 {
            break;
        }
        let n = vertices.len() as i64;
        let at = |i: i64| i.rem_euclid(n) as usize;
        let (a, b, c) = (at(index - 1), at(index), at(index + 1));
        if is_spiked(vertices[a], vertices[b], vertices[c]) {
            vertices.remove(b);
            index -= 2;
        }
        index += 1;
    }

    if vertices.len() < 3 {
        return LineString::new(vec![]);
    }
    vertices.push(vertices[0]);
    LineString::new(vertices)
}

/// Remove spikes from every ring of a multipolygon.
///
/// Rings left invalid are passed through [`fix_ring`]. An exterior that
/// cannot be repaired falls back to the original ring when that ring was
/// valid, and a polygon that comes out invalid is kept unchanged.
///
/// # Errors
///
/// Returns [`GeometryError::Despike`] when the result is empty or invalid,
/// or when its area differs from the input's by more than half.
pub fn despike(multi: &MultiPolygon<f64>) -> GeometryResult<MultiPolygon<f64>> {
    let mut polys = Vec::with_capacity(multi.0.len());
    for poly in &multi.0 {
        let mut holes = Vec::with_capacity(poly.interiors().len());
        for hole in poly.interiors() {
            let mut ring = despike_ring(hole);
            if !is_valid_ring(&ring) {
                ring = fix_ring(&ring)?;
            }
            if !ring.0.is_empty() {
                holes.push(ring);
            }
        }

        let exterior = poly.exterior();
        let mut ring = despike_ring(exterior);
        if !is_valid_ring(&ring) {
            ring = match fix_ring(&ring) {
                Ok(fixed) => fixed,
                Err(_) if is_valid_ring(exterior) => exterior.clone(),
                Err(e) => return Err(e),
            };
        }

        if !ring.0.is_empty() {
            let candidate = Polygon::new(ring, holes);
            if is_valid_polygon(&candidate) {
                polys.push(candidate);
            } else {
                polys.push(poly.clone());
            }
        }
    }

    let result = MultiPolygon::new(polys);
    if result.0.is_empty() || !is_valid(&result) {
        return Err(GeometryError::Despike("result is empty or invalid".to_string()));
    }
    let before = area(multi);
    let after = area(&result);
    if (after / before - 1.0).abs() > MAX_AREA_CHANGE {
        return Err(GeometryError::Despike(format!(
            "area changed from {before} to {after}"
        )));
    }
    debug!(before, after, "despiked multipolygon");
    Ok(result)
}
