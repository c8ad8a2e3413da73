//! cartos-geom - Footprint polygons for the cartos cartography engine
//!
//! All geometry is carried as [`geo::MultiPolygon<f64>`] in one of three
//! coordinate systems: `(lon, lat)`, projection `(x, y)` or image
//! `(sample, line)`. This crate provides:
//!
//! - [`convert`] - moving polygons between those coordinate systems
//! - [`despike`] / [`fix`] - removal of spikes and near-duplicate vertices
//! - [`ops`] - intersection, difference and union with precision fallback
//! - [`precision`] - significant-digit rounding and equality
//! - [`seam`] - splitting footprints at the 0/360 seam, and `to_180`
//! - [`validity`] - ring, polygon and multipolygon validity checks
//! - [`wkt`] - the `MULTIPOLYGON` text form stored in footprint blobs
//! - [`footprint`] - footprint computation from a camera model
//!
//! # Example
//!
//! ```ignore
//! use cartos_geom::{FootprintOptions, ImagePolygon};
//!
//! let footprint = ImagePolygon::new(FootprintOptions::default()).compute(&mut camera)?;
//! cartos_geom::footprint::write_footprint(&mut cube, &footprint)?;
//! ```

mod error;
pub mod convert;
pub mod despike;
pub mod fix;
pub mod footprint;
pub mod ops;
pub mod precision;
pub mod seam;
pub mod validity;
pub mod wkt;

pub use convert::{lat_lon_to_sample_line, lat_lon_to_xy, xy_to_lat_lon};
pub use despike::{despike, despike_ring, is_spiked};
pub use error::{GeometryError, GeometryResult};
pub use fix::fix_geometry;
pub use footprint::{FootprintOptions, ImagePolygon, Increment};
pub use ops::{
    Operation, area, difference, intersect, make_multi_polygon, thickness, union,
};
pub use precision::{decimal_place, equal, equal_f64, reduce_precision};
pub use seam::{fix_seam, split_360, to_180};
pub use validity::{is_valid, is_valid_polygon, is_valid_ring};
pub use wkt::{from_wkt, to_wkt};
