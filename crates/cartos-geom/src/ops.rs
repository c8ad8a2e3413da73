//! Polygon set operations
//!
//! Intersection, union and difference over [`geo::BooleanOps`], with a
//! fallback ladder for inputs the sweep cannot handle: the first operand is
//! snapped onto the second's vertices, and a failed operation is retried at
//! 14 and then 13 significant digits. A failure at 13 digits is reported.
//! Results that come out invalid are passed through [`fix_geometry`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{GeometryError, GeometryResult};
use crate::fix::fix_geometry;
use crate::precision::reduce_multi_polygon_precision;
use crate::validity::is_valid;
use geo::{Area, BooleanOps, BoundingRect, Coord, Geometry, MultiPolygon, Polygon};
use tracing::{debug, warn};

/// Vertices of the first operand closer than this to a vertex of the
/// second are moved onto it.
const SNAP_TOLERANCE: f64 = 1.0e-10;

/// Significant digits tried, in order, after a failed operation.
const FALLBACK_PRECISIONS: [u32; 2] = [14, 13];

/// Largest area change accepted when repairing a result.
const MAX_REPAIR_CHANGE: f64 = 0.5;

/// Set operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Intersection,
    Union,
    Difference,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Intersection => "Intersection",
            Self::Union => "Union",
            Self::Difference => "Difference",
        };
        f.write_str(name)
    }
}

/// Total unsigned area.
pub fn area(multi: &MultiPolygon<f64>) -> f64 {
    multi.unsigned_area()
}

/// Area over the square of the longer bounding-box side.
///
/// A square scores 1, a sliver close to 0. An empty multipolygon scores 0.
pub fn thickness(multi: &MultiPolygon<f64>) -> f64 {
    let Some(rect) = multi.bounding_rect() else {
        return 0.0;
    };
    let longest = rect.width().max(rect.height());
    if longest <= 0.0 {
        return 0.0;
    }
    area(multi) / (longest * longest)
}

/// Collect the polygonal parts of a geometry.
///
/// Polygons of area at most machine epsilon are dropped. Points and lines,
/// and collections without polygons, give an empty multipolygon.
pub fn make_multi_polygon(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    let mut polys = Vec::new();
    collect_polygons(geometry, &mut polys);
    MultiPolygon::new(polys)
}

fn collect_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => push_if_sized(p.clone(), out),
        Geometry::MultiPolygon(mp) => {
            for p in &mp.0 {
                push_if_sized(p.clone(), out);
            }
        }
        Geometry::Rect(r) => push_if_sized(r.to_polygon(), out),
        Geometry::Triangle(t) => push_if_sized(t.to_polygon(), out),
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn push_if_sized(polygon: Polygon<f64>, out: &mut Vec<Polygon<f64>>) {
    if polygon.unsigned_area() - f64::EPSILON > f64::EPSILON {
        out.push(polygon);
    }
}

fn coerce(multi: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    make_multi_polygon(&Geometry::MultiPolygon(multi.clone()))
}

/// Intersection of two multipolygons.
///
/// # Errors
///
/// Returns [`GeometryError::Operation`] when the operation fails at every
/// precision, or [`GeometryError::Fix`] when an invalid result cannot be
/// repaired.
pub fn intersect(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> GeometryResult<MultiPolygon<f64>> {
    operate(Operation::Intersection, a, b)
}

/// Union of two multipolygons.
///
/// # Errors
///
/// See [`intersect`].
pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> GeometryResult<MultiPolygon<f64>> {
    operate(Operation::Union, a, b)
}

/// `a` minus `b`.
///
/// # Errors
///
/// See [`intersect`].
pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> GeometryResult<MultiPolygon<f64>> {
    operate(Operation::Difference, a, b)
}

fn operate(
    op: Operation,
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> GeometryResult<MultiPolygon<f64>> {
    let a = coerce(a);
    let b = coerce(b);
    let a = snap(&a, &b);

    let mut result = attempt(op, &a, &b);
    if result.is_none() {
        for precision in FALLBACK_PRECISIONS {
            debug!(%op, precision, "retrying set operation at reduced precision");
            let (Ok(ra), Ok(rb)) = (
                reduce_multi_polygon_precision(&a, precision),
                reduce_multi_polygon_precision(&b, precision),
            ) else {
                continue;
            };
            result = attempt(op, &ra, &rb);
            if result.is_some() {
                break;
            }
        }
    }
    let Some(result) = result else {
        return Err(GeometryError::Operation {
            op,
            reason: format!(
                "no result at {} significant digits",
                FALLBACK_PRECISIONS[FALLBACK_PRECISIONS.len() - 1]
            ),
        });
    };

    let result = coerce(&result);
    if result.0.is_empty() || is_valid(&result) {
        return Ok(result);
    }

    let fixed = fix_geometry(&result)?;
    let before = area(&result);
    let after = area(&fixed);
    if before > 0.0 && (after / before - 1.0).abs() > MAX_REPAIR_CHANGE {
        return Err(GeometryError::Operation {
            op,
            reason: format!("repair changed the area from {before} to {after}"),
        });
    }
    warn!(%op, before, after, "repaired invalid set operation result");
    Ok(fixed)
}

/// Run one operation, treating a panic in the sweep or a non-finite
/// vertex as failure.
fn attempt(
    op: Operation,
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> Option<MultiPolygon<f64>> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| match op {
        Operation::Intersection => a.intersection(b),
        Operation::Union => a.union(b),
        Operation::Difference => a.difference(b),
    }))
    .ok()?;

    let finite = result.0.iter().all(|p| {
        std::iter::once(p.exterior())
            .chain(p.interiors())
            .flat_map(|ring| ring.0.iter())
            .all(|c| c.x.is_finite() && c.y.is_finite())
    });
    finite.then_some(result)
}

/// Move vertices of `a` onto nearby vertices of `b`; the snapped copy is
/// used only if it is still valid.
fn snap(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let targets: Vec<Coord<f64>> = b
        .0
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring.0.iter().copied())
        .collect();
    if targets.is_empty() {
        return a.clone();
    }

    let mut moved = false;
    let mut snapped = a.clone();
    for poly in &mut snapped.0 {
        poly.exterior_mut(|ring| {
            for c in &mut ring.0 {
                moved |= snap_coord(c, &targets);
            }
        });
        poly.interiors_mut(|rings| {
            for ring in rings {
                for c in &mut ring.0 {
                    moved |= snap_coord(c, &targets);
                }
            }
        });
    }

    if moved && is_valid(&snapped) {
        snapped
    } else {
        a.clone()
    }
}

fn snap_coord(c: &mut Coord<f64>, targets: &[Coord<f64>]) -> bool {
    for t in targets {
        let d = (t.x - c.x).hypot(t.y - c.y);
        if d > 0.0 && d <= SNAP_TOLERANCE {
            *c = *t;
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{GeometryCollection, Point, Rect, polygon};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size)
        ]])
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Intersection.to_string(), "Intersection");
        assert_eq!(Operation::Difference.to_string(), "Difference");
    }

    #[test]
    fn test_basic_operations() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        assert!((area(&intersect(&a, &b).unwrap()) - 1.0).abs() < 1e-9);
        assert!((area(&union(&a, &b).unwrap()) - 7.0).abs() < 1e-9);
        assert!((area(&difference(&a, &b).unwrap()) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(5.0, 5.0, 1.0);
        assert!(intersect(&a, &b).unwrap().0.is_empty());
    }

    #[test]
    fn test_snap_moves_near_vertices() {
        let a = square(0.0, 0.0, 1.0 + 1e-12);
        let b = square(0.0, 0.0, 1.0);
        let snapped = snap(&a, &b);
        assert_eq!(snapped.0[0].exterior().0[1], Coord { x: 1.0, y: 0.0 });
    }

    #[test]
    fn test_thickness() {
        assert!((thickness(&square(0.0, 0.0, 3.0)) - 1.0).abs() < 1e-12);
        let sliver = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 1.0), (x: 0.0, y: 1.0)
        ]]);
        assert!((thickness(&sliver) - 0.1).abs() < 1e-12);
        assert_eq!(thickness(&MultiPolygon::new(vec![])), 0.0);
    }

    #[test]
    fn test_make_multi_polygon() {
        let rect = Geometry::Rect(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 2.0, y: 1.0 }));
        assert_eq!(make_multi_polygon(&rect).0.len(), 1);

        let point = Geometry::Point(Point::new(1.0, 1.0));
        assert!(make_multi_polygon(&point).0.is_empty());

        let gc = Geometry::GeometryCollection(GeometryCollection(vec![
            point,
            Geometry::MultiPolygon(square(0.0, 0.0, 1.0)),
            Geometry::MultiPolygon(square(3.0, 0.0, 1.0)),
        ]));
        assert_eq!(make_multi_polygon(&gc).0.len(), 2);
    }
}
