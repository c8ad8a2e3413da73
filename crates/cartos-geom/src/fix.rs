//! Near-duplicate vertex removal
//!
//! Two vertices whose difference is more than 15 decimal places smaller
//! than the coordinates themselves cannot be told apart by the set
//! operations. Such vertices are dropped.

use crate::error::{GeometryError, GeometryResult};
use crate::precision::decimal_place;
use crate::validity::{is_valid_polygon, is_valid_ring};
use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Largest decimal-place gap between a coordinate and a vertex delta.
const MAX_PLACE_GAP: i32 = 15;

/// Drop vertices too close to their predecessor.
///
/// Returns the input unchanged when the result would be invalid, and an
/// empty ring for rings with fewer than four coordinates.
///
/// # Errors
///
/// Returns [`GeometryError::Fix`] when a valid ring becomes invalid.
pub fn fix_ring(ring: &LineString<f64>) -> GeometryResult<LineString<f64>> {
    let coords = &ring.0;
    if coords.len() < 4 {
        return Ok(LineString::new(vec![]));
    }

    let mut kept: Vec<Coord<f64>> = vec![coords[0]];
    let mut last = coords[0];
    for &current in &coords[1..coords.len() - 1] {
        if place_gap(last, current) <= MAX_PLACE_GAP {
            kept.push(current);
            last = current;
        }
    }
    kept.push(kept[0]);

    if kept.len() > 3 {
        let fixed = LineString::new(kept);
        if is_valid_ring(&fixed) {
            return Ok(fixed);
        }
        if is_valid_ring(ring) {
            return Err(GeometryError::Fix("linear ring".to_string()));
        }
    }
    Ok(ring.clone())
}

fn place_gap(last: Coord<f64>, current: Coord<f64>) -> i32 {
    let dx = last.x - current.x;
    let dy = last.y - current.y;
    let gap_x = (decimal_place(current.x) - decimal_place(dx)).abs();
    let gap_y = (decimal_place(current.y) - decimal_place(dy)).abs();
    match (dx == 0.0, dy == 0.0) {
        (true, true) => i32::MAX,
        (true, false) => gap_y,
        (false, true) => gap_x,
        (false, false) => gap_x.min(gap_y),
    }
}

/// Fix the exterior and every hole of a polygon.
///
/// # Errors
///
/// Returns [`GeometryError::Fix`] naming the ring that failed.
pub fn fix_polygon(polygon: &Polygon<f64>) -> GeometryResult<Polygon<f64>> {
    let mut holes = Vec::with_capacity(polygon.interiors().len());
    for hole in polygon.interiors() {
        let fixed = fix_ring(hole)
            .map_err(|_| GeometryError::Fix("interior ring of multipolygon".to_string()))?;
        holes.push(fixed);
    }
    let exterior = fix_ring(polygon.exterior())
        .map_err(|_| GeometryError::Fix("exterior ring of polygon".to_string()))?;
    Ok(Polygon::new(exterior, holes))
}

/// Fix every polygon of a multipolygon, dropping those still invalid.
///
/// # Errors
///
/// Returns [`GeometryError::Fix`] when a ring cannot be fixed.
pub fn fix_geometry(multi: &MultiPolygon<f64>) -> GeometryResult<MultiPolygon<f64>> {
    let mut polys = Vec::with_capacity(multi.0.len());
    for poly in &multi.0 {
        let fixed = fix_polygon(poly)?;
        if is_valid_polygon(&fixed) {
            polys.push(fixed);
        }
    }
    Ok(MultiPolygon::new(polys))
}
