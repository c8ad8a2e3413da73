//! Significant-digit rounding and equality
//!
//! Set operations retry at fewer significant digits when they fail, and
//! footprints are compared at 15 significant digits. Both use the decimal
//! place of a number: the power of ten `p` with `|num| / 10^p` in
//! `[0.1, 1)`, so `decimal_place(1.5) == 1` and `decimal_place(0.05) == -1`.

use crate::despike::despike_ring;
use crate::error::{GeometryError, GeometryResult};
use crate::validity::is_valid_ring;
use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Significant digits used by [`equal_f64`].
const EQUAL_DIGITS: i32 = 15;

/// Decimal place of a number; zero for zero.
pub fn decimal_place(num: f64) -> i32 {
    if num == 0.0 || !num.is_finite() {
        return 0;
    }
    let mut num = num.abs();
    let mut place = 1;
    while num < 1.0 {
        num *= 10.0;
        place -= 1;
    }
    while num > 10.0 {
        num /= 10.0;
        place += 1;
    }
    place
}

/// Round `num` to `precision` significant digits (half away from zero).
pub fn reduce_precision(num: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(decimal_place(num));
    let cutoff = 10f64.powi(precision as i32);
    let offset = if num < 0.0 { -0.5 } else { 0.5 };
    let reduced = ((num / factor * cutoff + offset) as i64) as f64 / cutoff;
    reduced * factor
}

/// Round a closed ring's coordinates, then remove any spikes the rounding
/// produced.
///
/// # Errors
///
/// Returns [`GeometryError::Fix`] when the rounded ring is invalid.
pub fn reduce_ring_precision(ring: &LineString<f64>, precision: u32) -> GeometryResult<LineString<f64>> {
    if ring.0.len() < 2 {
        return Ok(ring.clone());
    }
    let round = |c: &Coord<f64>| Coord {
        x: reduce_precision(c.x, precision),
        y: reduce_precision(c.y, precision),
    };
    let n = ring.0.len();
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(n);
    coords.push(round(&ring.0[0]));
    for c in &ring.0[1..n - 1] {
        coords.push(round(c));
    }
    coords.push(coords[0]);

    let rounded = despike_ring(&LineString::new(coords));
    if !is_valid_ring(&rounded) {
        return Err(GeometryError::Fix(format!(
            "linear ring after reducing precision to {precision} digits"
        )));
    }
    Ok(rounded)
}

/// Round every ring of a polygon; emptied holes are dropped.
///
/// # Errors
///
/// Returns [`GeometryError::Fix`] when a ring cannot be rounded.
pub fn reduce_polygon_precision(polygon: &Polygon<f64>, precision: u32) -> GeometryResult<Polygon<f64>> {
    let mut holes = Vec::with_capacity(polygon.interiors().len());
    for hole in polygon.interiors() {
        let rounded = reduce_ring_precision(hole, precision)
            .map_err(|_| GeometryError::Fix("interior ring of multipolygon".to_string()))?;
        if !rounded.0.is_empty() {
            holes.push(rounded);
        }
    }
    let exterior = reduce_ring_precision(polygon.exterior(), precision)
        .map_err(|_| GeometryError::Fix("exterior ring of polygon".to_string()))?;
    Ok(Polygon::new(exterior, holes))
}

/// Round every polygon of a multipolygon; emptied polygons are dropped.
///
/// # Errors
///
/// Returns [`GeometryError::Fix`] when a ring cannot be rounded.
pub fn reduce_multi_polygon_precision(
    multi: &MultiPolygon<f64>,
    precision: u32,
) -> GeometryResult<MultiPolygon<f64>> {
    let mut polys = Vec::with_capacity(multi.0.len());
    for poly in &multi.0 {
        let rounded = reduce_polygon_precision(poly, precision)?;
        if !rounded.exterior().0.is_empty() {
            polys.push(rounded);
        }
    }
    Ok(MultiPolygon::new(polys))
}

/// Compare two numbers at 15 significant digits.
pub fn equal_f64(a: f64, b: f64) -> bool {
    let place = decimal_place(a);
    if place != decimal_place(b) {
        return false;
    }
    let factor = 10f64.powi(place);
    let cutoff = 10f64.powi(EQUAL_DIGITS);
    let digits = |v: f64| {
        let offset = if v < 0.0 { -0.5 } else { 0.5 };
        (v / factor * cutoff + offset) as i64
    };
    digits(a) == digits(b)
}

/// Compare two coordinates at 15 significant digits.
pub fn equal_coords(a: Coord<f64>, b: Coord<f64>) -> bool {
    equal_f64(a.x, b.x) && equal_f64(a.y, b.y)
}

/// Compare two closed rings vertex by vertex, allowing the second to start
/// at any vertex of the first.
pub fn equal_rings(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let n = a.0.len();
    if n != b.0.len() {
        return false;
    }
    if n < 2 {
        return n == 0 || equal_coords(a.0[0], b.0[0]);
    }
    let open = n - 1;
    let Some(start) = b.0[..open].iter().position(|c| equal_coords(a.0[0], *c)) else {
        return false;
    };
    (0..open).all(|i| equal_coords(a.0[i], b.0[(start + i) % open]))
}

/// Compare two polygons: equal exteriors and the same holes in any order.
pub fn equal_polygons(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    if a.interiors().len() != b.interiors().len() || !equal_rings(a.exterior(), b.exterior()) {
        return false;
    }
    matched_all(a.interiors(), b.interiors(), equal_rings)
}

/// Compare two multipolygons member by member, in any order.
pub fn equal(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.0.len() == b.0.len() && matched_all(&a.0, &b.0, equal_polygons)
}

fn matched_all<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        match b
            .iter()
            .enumerate()
            .position(|(j, y)| !used[j] && eq(x, y))
        {
            Some(j) => {
                used[j] = true;
                true
            }
            None => false,
        }
    })
}
