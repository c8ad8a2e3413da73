//! cartos - Planetary cartography for Rust
//!
//! Map projections, camera-to-map warping, footprint polygons, image
//! overlaps and mosaics for planetary images.
//!
//! # Overview
//!
//! - [`proj`] - map projections built from a label's `Mapping` group
//! - [`transform`] - interpolation, pixel transforms and the rubber-sheet
//!   warp engine (`cam2map`, `map2map`)
//! - [`geom`] - footprint polygons, seam handling and set operations
//! - [`mosaic`] - overlap enumeration, mosaic placement and push-frame
//!   stitching
//!
//! Core types (cubes, labels, special pixels, the camera interface) are
//! re-exported at the top level.
//!
//! # Example
//!
//! ```
//! use cartos::{Cube, RasterView};
//! use cartos::mosaic::{Mosaic, MosaicOptions, Priority};
//!
//! let engine = Mosaic::new(MosaicOptions {
//!     priority: Priority::PlaceImagesBeneath,
//!     ..MosaicOptions::default()
//! });
//! let mut mosaic = engine.create(4, 4, 1, cartos::PixelType::Real).unwrap();
//! let image = Cube::new_with_value(2, 2, 1, 100.0).unwrap();
//! engine.place(&image, &mut mosaic, 2, 2, 1).unwrap();
//! assert_eq!(mosaic.read(3, 3, 1), 100.0);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use cartos_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use cartos_geom as geom;
pub use cartos_mosaic as mosaic;
pub use cartos_proj as proj;
pub use cartos_transform as transform;
