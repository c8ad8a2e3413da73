//! Validity checks
//!
//! A ring is valid when it is closed, has at least three distinct
//! vertices, encloses a non-zero area and neither touches itself nor turns
//! back along its own edge. A polygon also needs every hole inside its
//! exterior without crossing it. A multipolygon also needs its members'
//! interiors to be disjoint. Members and holes may touch at points.
//!
//! Consecutive repeated vertices are tolerated.

use geo::{Coord, InteriorPoint, LineString, MultiPolygon, Polygon};

/// Where a point lies relative to a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Inside,
    Boundary,
    Outside,
}

/// Check a single closed ring.
pub fn is_valid_ring(ring: &LineString<f64>) -> bool {
    let coords = &ring.0;
    if coords.len() < 4 || coords.first() != coords.last() {
        return false;
    }
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return false;
    }
    let pts = distinct_vertices(coords);
    if pts.len() < 3 || signed_area(&pts) == 0.0 {
        return false;
    }
    !self_intersects(&pts)
}

/// Check a polygon and its holes.
pub fn is_valid_polygon(polygon: &Polygon<f64>) -> bool {
    let exterior = polygon.exterior();
    if !is_valid_ring(exterior) {
        return false;
    }
    let holes = polygon.interiors();
    for (i, hole) in holes.iter().enumerate() {
        if !is_valid_ring(hole) {
            return false;
        }
        if rings_cross(&exterior.0, &hole.0) {
            return false;
        }
        let mut strictly_inside = false;
        for c in &hole.0 {
            match locate(*c, &exterior.0) {
                Location::Outside => return false,
                Location::Inside => strictly_inside = true,
                Location::Boundary => {}
            }
        }
        if !strictly_inside {
            return false;
        }
        for other in &holes[i + 1..] {
            if rings_cross(&hole.0, &other.0)
                || hole.0.iter().any(|c| locate(*c, &other.0) == Location::Inside)
                || other.0.iter().any(|c| locate(*c, &hole.0) == Location::Inside)
            {
                return false;
            }
        }
    }
    true
}

/// Check a multipolygon. The empty multipolygon is valid.
pub fn is_valid(multi: &MultiPolygon<f64>) -> bool {
    if !multi.0.iter().all(is_valid_polygon) {
        return false;
    }
    for (i, a) in multi.0.iter().enumerate() {
        for b in &multi.0[i + 1..] {
            if polygons_overlap(a, b) {
                return false;
            }
        }
    }
    true
}

/// Vertices of a closed ring with consecutive duplicates and the closing
/// vertex removed.
pub(crate) fn distinct_vertices(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut pts: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        if pts.last() != Some(c) {
            pts.push(*c);
        }
    }
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    pts
}

/// Shoelace area of an open or closed vertex list; positive when
/// counter-clockwise with y up.
pub(crate) fn signed_area(pts: &[Coord<f64>]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

pub(crate) fn orient(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

pub(crate) fn on_segment(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> bool {
    orient(a, b, p) == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Closed-segment intersection, touching included.
pub(crate) fn segments_intersect(
    p1: Coord<f64>,
    p2: Coord<f64>,
    q1: Coord<f64>,
    q2: Coord<f64>,
) -> bool {
    if segments_cross(p1, p2, q1, q2) {
        return true;
    }
    on_segment(q1, q2, p1) || on_segment(q1, q2, p2) || on_segment(p1, p2, q1) || on_segment(p1, p2, q2)
}

/// Proper crossing: each segment strictly separates the other's endpoints.
pub(crate) fn segments_cross(
    p1: Coord<f64>,
    p2: Coord<f64>,
    q1: Coord<f64>,
    q2: Coord<f64>,
) -> bool {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Distance from `p` to the segment `a-b`.
pub(crate) fn point_segment_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return (p.x - a.x).hypot(p.y - a.y);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    (p.x - (a.x + t * dx)).hypot(p.y - (a.y + t * dy))
}

/// Locate a point against a closed ring by ray crossing.
pub(crate) fn locate(p: Coord<f64>, ring: &[Coord<f64>]) -> Location {
    let mut inside = false;
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        if on_segment(a, b, p) {
            return Location::Boundary;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

/// Locate a point against a polygon, holes included.
pub(crate) fn locate_in_polygon(p: Coord<f64>, polygon: &Polygon<f64>) -> Location {
    match locate(p, &polygon.exterior().0) {
        Location::Inside => {
            for hole in polygon.interiors() {
                match locate(p, &hole.0) {
                    Location::Inside => return Location::Outside,
                    Location::Boundary => return Location::Boundary,
                    Location::Outside => {}
                }
            }
            Location::Inside
        }
        other => other,
    }
}

fn self_intersects(pts: &[Coord<f64>]) -> bool {
    let n = pts.len();
    let seg = |i: usize| (pts[i], pts[(i + 1) % n]);

    // Turning straight back along the previous edge
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let c = pts[(i + 2) % n];
        let (ux, uy) = (b.x - a.x, b.y - a.y);
        let (vx, vy) = (c.x - b.x, c.y - b.y);
        if ux * vy - uy * vx == 0.0 && ux * vx + uy * vy < 0.0 {
            return true;
        }
    }

    for i in 0..n {
        let (p1, p2) = seg(i);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (q1, q2) = seg(j);
            if p1.x.max(p2.x) < q1.x.min(q2.x)
                || q1.x.max(q2.x) < p1.x.min(p2.x)
                || p1.y.max(p2.y) < q1.y.min(q2.y)
                || q1.y.max(q2.y) < p1.y.min(p2.y)
            {
                continue;
            }
            if segments_intersect(p1, p2, q1, q2) {
                return true;
            }
        }
    }
    false
}

fn rings_cross(a: &[Coord<f64>], b: &[Coord<f64>]) -> bool {
    a.windows(2).any(|s| {
        b.windows(2)
            .any(|t| segments_cross(s[0], s[1], t[0], t[1]))
    })
}

fn polygons_overlap(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    if rings_cross(&a.exterior().0, &b.exterior().0) {
        return true;
    }
    let inside = |ring: &LineString<f64>, poly: &Polygon<f64>| {
        ring.0
            .iter()
            .any(|c| locate_in_polygon(*c, poly) == Location::Inside)
    };
    if inside(a.exterior(), b) || inside(b.exterior(), a) {
        return true;
    }
    // Coincident shells put every vertex on the boundary
    let probe = |from: &Polygon<f64>, into: &Polygon<f64>| {
        from.interior_point()
            .is_some_and(|p| locate_in_polygon(p.0, into) == Location::Inside)
    };
    probe(a, b) || probe(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, polygon};

    fn ring(pts: &[(f64, f64)]) -> LineString<f64> {
        LineString::from(pts.to_vec())
    }

    #[test]
    fn test_square_ring_is_valid() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert!(is_valid_ring(&r));
    }

    #[test]
    fn test_open_or_short_ring_is_invalid() {
        assert!(!is_valid_ring(&ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])));
        assert!(!is_valid_ring(&ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)])));
        let open = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(!is_valid_ring(&open));
    }

    #[test]
    fn test_bow_tie_is_invalid() {
        let r = ring(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]);
        assert!(!is_valid_ring(&r));
    }

    #[test]
    fn test_spike_is_invalid() {
        let r = ring(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]);
        assert!(!is_valid_ring(&r));
    }

    #[test]
    fn test_repeated_vertex_is_tolerated() {
        let r = ring(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]);
        assert!(is_valid_ring(&r));
    }

    #[test]
    fn test_hole_rules() {
        let good = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 4.0), (x: 2.0, y: 4.0)]]
        );
        assert!(is_valid_polygon(&good));

        let outside = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 12.0, y: 2.0), (x: 14.0, y: 2.0), (x: 14.0, y: 4.0), (x: 12.0, y: 4.0)]]
        );
        assert!(!is_valid_polygon(&outside));
    }

    #[test]
    fn test_overlapping_members_are_invalid() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
        let b = polygon![(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)];
        let touching = polygon![(x: 2.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 2.0), (x: 2.0, y: 2.0)];
        assert!(!is_valid(&MultiPolygon::new(vec![a.clone(), b])));
        assert!(!is_valid(&MultiPolygon::new(vec![a.clone(), a.clone()])));
        assert!(is_valid(&MultiPolygon::new(vec![a, touching])));
        assert!(is_valid(&MultiPolygon::new(vec![])));
    }

    #[test]
    fn test_point_location() {
        let r = ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]).0;
        assert_eq!(locate(Coord { x: 1.0, y: 1.0 }, &r), Location::Inside);
        assert_eq!(locate(Coord { x: 2.0, y: 1.0 }, &r), Location::Boundary);
        assert_eq!(locate(Coord { x: 3.0, y: 1.0 }, &r), Location::Outside);
    }
}
