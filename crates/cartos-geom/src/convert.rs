//! Coordinate conversion of polygons
//!
//! Converts every vertex through a projection or camera. A ring with a
//! vertex that cannot be converted is dropped along with its polygon (for
//! an exterior) or on its own (for a hole). If the converted polygons are
//! invalid they are despiked once before giving up.

use crate::despike::despike;
use crate::error::{GeometryError, GeometryResult};
use crate::ops::area;
use crate::validity::{is_valid, is_valid_polygon, is_valid_ring};
use cartos_core::Camera;
use cartos_proj::TProjection;
use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Converted polygons at or below this area are dropped.
const MIN_CONVERTED_AREA: f64 = 1.0e-14;

/// Project longitude/latitude polygons (`x` = longitude) to projection x/y.
///
/// # Errors
///
/// Returns [`GeometryError::Conversion`] when the result is invalid and
/// cannot be despiked.
pub fn lat_lon_to_xy(
    lon_lat: &MultiPolygon<f64>,
    projection: &mut dyn TProjection,
) -> GeometryResult<MultiPolygon<f64>> {
    convert(lon_lat, "Lon/Lat", "X/Y", |c| {
        projection
            .set_ground(c.y, c.x)
            .then(|| Coord { x: projection.x_coord(), y: projection.y_coord() })
    })
}

/// Unproject x/y polygons to longitude/latitude (`x` = longitude) in the
/// projection's own conventions.
///
/// # Errors
///
/// Returns [`GeometryError::Conversion`] when the result is invalid and
/// cannot be despiked.
pub fn xy_to_lat_lon(
    xy: &MultiPolygon<f64>,
    projection: &mut dyn TProjection,
) -> GeometryResult<MultiPolygon<f64>> {
    convert(xy, "X/Y", "Lon/Lat", |c| {
        projection
            .set_coordinate(c.x, c.y)
            .then(|| Coord { x: projection.longitude(), y: projection.latitude() })
    })
}

/// Map universal longitude/latitude polygons into camera sample/line.
///
/// # Errors
///
/// Returns [`GeometryError::Conversion`] when the result is invalid and
/// cannot be despiked.
pub fn lat_lon_to_sample_line(
    lon_lat: &MultiPolygon<f64>,
    camera: &mut dyn Camera,
) -> GeometryResult<MultiPolygon<f64>> {
    convert(lon_lat, "Lon/Lat", "Sample/Line", |c| {
        camera
            .set_universal_ground(c.y, c.x)
            .then(|| Coord { x: camera.sample(), y: camera.line() })
    })
}

fn convert(
    multi: &MultiPolygon<f64>,
    from: &'static str,
    to: &'static str,
    mut point: impl FnMut(Coord<f64>) -> Option<Coord<f64>>,
) -> GeometryResult<MultiPolygon<f64>> {
    let mut polys = Vec::with_capacity(multi.0.len());
    for poly in &multi.0 {
        let Some(exterior) = convert_ring(poly.exterior(), &mut point) else {
            continue;
        };
        let holes: Vec<LineString<f64>> = poly
            .interiors()
            .iter()
            .filter_map(|hole| convert_ring(hole, &mut point))
            .filter(|hole| !hole.0.is_empty() && is_valid_ring(hole))
            .collect();

        let converted = Polygon::new(exterior, holes);
        let size = area(&MultiPolygon::new(vec![converted.clone()]));
        if is_valid_polygon(&converted) && size > MIN_CONVERTED_AREA {
            polys.push(converted);
        }
    }

    let result = MultiPolygon::new(polys);
    if multi.0.is_empty() || (!result.0.is_empty() && is_valid(&result)) {
        return Ok(result);
    }
    despike(&result).map_err(|_| GeometryError::Conversion { from, to })
}

fn convert_ring(
    ring: &LineString<f64>,
    point: &mut impl FnMut(Coord<f64>) -> Option<Coord<f64>>,
) -> Option<LineString<f64>> {
    let n = ring.0.len();
    if n < 2 {
        return Some(LineString::new(vec![]));
    }
    let mut coords = Vec::with_capacity(n);
    for &c in &ring.0[..n - 1] {
        coords.push(point(c)?);
    }
    coords.push(coords[0]);
    Some(LineString::new(coords))
}
