//! Longitude seam handling
//!
//! Footprints are stored in the `[0, 360]` longitude domain. A traced
//! footprint that crosses the 0/360 seam comes out as one ring whose
//! longitudes jump by about 360 degrees. [`split_360`] unwraps that ring,
//! cuts it along the seam and shifts the pieces back into the domain.
//! [`to_180`] does the same for the `[-180, 180]` domain.

use crate::despike::despike;
use crate::error::{GeometryError, GeometryResult};
use crate::ops::{intersect, make_multi_polygon, union};
use crate::validity::is_valid_polygon;
use geo::algorithm::orient::{Direction, Orient};
use geo::{BoundingRect, Coord, Geometry, LineString, MapCoords, MultiPolygon, Polygon};
use tracing::debug;

/// Default spacing of the extra vertices put on seam cut lines.
const SEAM_STEP: f64 = 1.0;

/// Unwrap a closed `(lon, lat)` ring and split it at 0 and 360 degrees.
///
/// A longitude jump of more than 180 degrees starts (or ends) a run of
/// vertices shifted by 360 degrees, unless the previous vertex is on a
/// pole. When every unwrapped longitude lies in `[0, 360]` the ring is
/// returned as a single polygon. Otherwise the parts west of 0 and east of
/// 360 are cut off and shifted into `[0, 360]`, and pieces that share an
/// edge are merged again. All exteriors come back counterclockwise.
///
/// # Errors
///
/// Returns [`GeometryError::Footprint`] for rings with fewer than four
/// coordinates, or the error of a failed set operation.
pub fn split_360(ring: &LineString<f64>) -> GeometryResult<MultiPolygon<f64>> {
    let coords = &ring.0;
    if coords.len() < 4 {
        return Err(GeometryError::Footprint(
            "Unable to split a footprint ring with fewer than 4 points".to_string(),
        ));
    }

    let mut unwrapped = Vec::with_capacity(coords.len());
    unwrapped.push(coords[0]);
    let mut offset = 0.0;
    let mut shifting = false;
    let mut step = 0.0;
    for pair in coords.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let jump = cur.x - prev.x;
        if jump.abs() > 180.0 && prev.y != 90.0 && prev.y != -90.0 {
            if shifting {
                offset = 0.0;
                shifting = false;
            } else {
                offset = if jump > 0.0 { -360.0 } else { 360.0 };
                shifting = true;
            }
            if step == 0.0 {
                step = (cur.x + offset - prev.x).hypot(cur.y - prev.y);
            }
        }
        unwrapped.push(Coord { x: cur.x + offset, y: cur.y });
    }

    let polygon = Polygon::new(LineString::new(unwrapped), vec![]);
    let Some(bounds) = polygon.bounding_rect() else {
        return Ok(MultiPolygon::new(vec![]));
    };
    if bounds.min().x >= 0.0 && bounds.max().x <= 360.0 {
        let single = make_multi_polygon(&Geometry::Polygon(polygon));
        return Ok(single.orient(Direction::Default));
    }

    let step = if step > 0.0 { step.max(SEAM_STEP) } else { SEAM_STEP };
    let whole = MultiPolygon::new(vec![polygon]);
    let mut pieces = Vec::new();
    for (west, east, shift) in [(-360.0, 0.0, 360.0), (0.0, 360.0, 0.0), (360.0, 720.0, -360.0)] {
        if bounds.max().x <= west || bounds.min().x >= east {
            continue;
        }
        let cut = intersect(&whole, &seam_box(west, east, step))?;
        let shifted = cut.map_coords(|c| Coord { x: c.x + shift, y: c.y });
        // Drop the cut-line vertices that ended up collinear
        let cleaned = despike(&shifted).unwrap_or(shifted);
        pieces.extend(cleaned.0);
    }
    debug!(pieces = pieces.len(), step, "split footprint at the 0/360 seam");

    let merged = fix_seam(&MultiPolygon::new(pieces))?;
    Ok(merged.orient(Direction::Default))
}

/// Rectangle from `west` to `east` spanning all latitudes, with extra
/// vertices every `step` degrees along its two meridians.
fn seam_box(west: f64, east: f64, step: f64) -> MultiPolygon<f64> {
    let mut coords = vec![Coord { x: west, y: -90.0 }, Coord { x: east, y: -90.0 }];
    let mut lat = -90.0 + step;
    while lat < 90.0 {
        coords.push(Coord { x: east, y: lat });
        lat += step;
    }
    coords.push(Coord { x: east, y: 90.0 });
    coords.push(Coord { x: west, y: 90.0 });
    let mut lat = 90.0 - step;
    while lat > -90.0 {
        coords.push(Coord { x: west, y: lat });
        lat -= step;
    }
    MultiPolygon::new(vec![Polygon::new(LineString::new(coords), vec![])])
}

/// Merge polygons that share an edge.
///
/// Repeats until no two members share an edge. A merge that does not give
/// exactly one valid polygon is skipped.
///
/// # Errors
///
/// Returns the error of a failed union.
pub fn fix_seam(multi: &MultiPolygon<f64>) -> GeometryResult<MultiPolygon<f64>> {
    let mut polys = multi.0.clone();
    let mut skipped: Vec<(usize, usize)> = Vec::new();
    'search: loop {
        for i in 0..polys.len() {
            for j in (i + 1)..polys.len() {
                if skipped.contains(&(i, j)) || !share_edge(&polys[i], &polys[j]) {
                    continue;
                }
                let merged = union(
                    &MultiPolygon::new(vec![polys[i].clone()]),
                    &MultiPolygon::new(vec![polys[j].clone()]),
                )?;
                if merged.0.len() == 1 && is_valid_polygon(&merged.0[0]) {
                    if let Some(joined) = merged.0.into_iter().next() {
                        polys[i] = joined;
                        polys.remove(j);
                        skipped.clear();
                        continue 'search;
                    }
                }
                skipped.push((i, j));
            }
        }
        break;
    }
    Ok(MultiPolygon::new(polys))
}

fn share_edge(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    let edges = |p: &Polygon<f64>| -> Vec<(Coord<f64>, Coord<f64>)> {
        p.exterior().0.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let b_edges = edges(b);
    edges(a).iter().any(|&(p, q)| {
        b_edges
            .iter()
            .any(|&(r, s)| (p == r && q == s) || (p == s && q == r))
    })
}

/// Move a `(lon, lat)` multipolygon into the `[-180, 180]` domain.
///
/// Parts east of 180 degrees are shifted west by 360 and merged with the
/// rest.
///
/// # Errors
///
/// Returns the error of a failed set operation.
pub fn to_180(multi: &MultiPolygon<f64>) -> GeometryResult<MultiPolygon<f64>> {
    let west = intersect(multi, &lon_box(-360.0, 180.0))?;
    let east = intersect(multi, &lon_box(180.0, 720.0))?
        .map_coords(|c| Coord { x: c.x - 360.0, y: c.y });
    if east.0.is_empty() {
        return Ok(west);
    }
    if west.0.is_empty() {
        return Ok(east);
    }
    union(&west, &east)
}

fn lon_box(west: f64, east: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![Polygon::new(
        LineString::from(vec![(west, -90.0), (east, -90.0), (east, 90.0), (west, 90.0)]),
        vec![],
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::area;
    use crate::precision::equal;
    use geo::polygon;

    #[test]
    fn test_split_inside_domain_is_unchanged() {
        let ring = LineString::from(vec![(10.0, 0.0), (20.0, 0.0), (20.0, 5.0), (10.0, 5.0), (10.0, 0.0)]);
        let out = split_360(&ring).unwrap();
        assert_eq!(out.0.len(), 1);
        assert!((area(&out) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_wrapped_ring() {
        // Traced longitudes jump from 358 to 2 and back
        let ring = LineString::from(vec![
            (356.0, 0.0),
            (358.0, 0.0),
            (2.0, 0.0),
            (4.0, 0.0),
            (4.0, 5.0),
            (2.0, 5.0),
            (358.0, 5.0),
            (356.0, 5.0),
            (356.0, 0.0),
        ]);
        let out = split_360(&ring).unwrap();
        assert_eq!(out.0.len(), 2);
        assert!((area(&out) - 40.0).abs() < 1e-6);
        let east = MultiPolygon::new(vec![polygon![
            (x: 356.0, y: 0.0), (x: 360.0, y: 0.0), (x: 360.0, y: 5.0), (x: 356.0, y: 5.0)
        ]]);
        let east_part = intersect(&out, &lon_box(180.0, 360.0)).unwrap();
        assert!((area(&east_part) - area(&east)).abs() < 1e-6);
    }

    #[test]
    fn test_split_short_ring_fails() {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        assert!(split_360(&ring).is_err());
    }

    #[test]
    fn test_fix_seam_merges_shared_edge() {
        let left = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let right = polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)];
        let far = polygon![(x: 5.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 1.0), (x: 5.0, y: 1.0)];
        let out = fix_seam(&MultiPolygon::new(vec![left, right, far.clone()])).unwrap();
        assert_eq!(out.0.len(), 2);
        assert!((area(&out) - 3.0).abs() < 1e-9);
        assert!(out.0.iter().any(|p| equal(
            &MultiPolygon::new(vec![p.clone()]),
            &MultiPolygon::new(vec![far.clone()])
        )));
    }

    #[test]
    fn test_to_180() {
        let mp = MultiPolygon::new(vec![polygon![
            (x: 170.0, y: 0.0), (x: 190.0, y: 0.0), (x: 190.0, y: 10.0), (x: 170.0, y: 10.0)
        ]]);
        let out = to_180(&mp).unwrap();
        assert!((area(&out) - 200.0).abs() < 1e-9);
        let rect = out.bounding_rect().unwrap();
        assert!((rect.min().x + 180.0).abs() < 1e-9);
        assert!((rect.max().x - 180.0).abs() < 1e-9);
    }
}
