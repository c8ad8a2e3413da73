//! cartos-mosaic - Overlaps, mosaics and push-frame stitching for the cartos
//! cartography engine
//!
//! This crate provides:
//!
//! - [`OverlapSet`] / [`ImageOverlap`] - partition of a set of footprints
//!   into pieces of ground and the images covering each piece, with the
//!   overlap list text format
//! - [`Mosaic`] - placement of one raster into another under a
//!   [`Priority`], with origin tracking and `BandBin` matching
//! - [`MapMosaic`] - placement of map-projected cubes by projection
//!   coordinates
//! - [`stitch`] / [`unstitch`] - push-frame framelets to one cube per
//!   observation and back
//!
//! # Example
//!
//! ```ignore
//! use cartos_mosaic::{Mosaic, MosaicOptions, Priority};
//!
//! let engine = Mosaic::new(MosaicOptions {
//!     priority: Priority::PlaceImagesBeneath,
//!     track: true,
//!     ..MosaicOptions::default()
//! });
//! let mut mosaic = engine.create(1000, 1000, 1, PixelType::Real)?;
//! engine.place(&image, &mut mosaic, 1, 1, 1)?;
//! ```

mod error;
pub mod map_mosaic;
pub mod mosaic;
pub mod options;
pub mod overlap;
pub mod serial;
pub mod stitch;

pub use error::{MosaicError, MosaicResult};
pub use map_mosaic::MapMosaic;
pub use mosaic::{InputImage, Mosaic, Placement};
pub use options::{BandCriteria, BandSelector, MosaicOptions, OverlapOptions, Priority, StitchOptions};
pub use overlap::{ImageOverlap, OverlapError, OverlapSet};
pub use stitch::{stitch, unstitch};
