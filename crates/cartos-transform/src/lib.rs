//! cartos-transform - Geometric warping for the cartos cartography engine
//!
//! This crate provides:
//!
//! - [`Interpolator`] - nearest neighbour, bilinear and cubic convolution
//!   resampling with special pixel handling
//! - [`Transform`] - pixel to pixel mappings between a camera image and a
//!   map, or between two maps
//! - [`RubberSheet`] - the resampling engine (reverse quad-tree tiles and
//!   forward patches)
//! - [`warp()`], [`cam2map()`], [`map2map()`] - the top-level operations
//!
//! # Example
//!
//! ```ignore
//! use cartos_transform::{Cam2MapOptions, cam2map};
//! use cartos_proj::ProjectionFactory;
//!
//! let output = cam2map(
//!     &mut camera,
//!     &input,
//!     &user_mapping,
//!     &Cam2MapOptions::default(),
//!     &ProjectionFactory::default(),
//! )?;
//! ```

mod error;
pub mod interpolator;
pub mod options;
pub mod rubber_sheet;
pub mod transform;
pub mod warp;

pub use error::{TransformError, TransformResult};
pub use interpolator::Interpolator;
pub use options::{
    Cam2MapOptions, LonSeam, Map2MapOptions, RangeMode, RangeOverrides, ResolutionMode,
    SourceRange, SourceResolution, WarpAlgorithm, WarpOptions,
};
pub use rubber_sheet::{PatchParameters, RubberSheet};
pub use transform::{
    Cam2MapForward, Cam2MapReverse, DEFAULT_OCCLUSION_TOLERANCE, Map2Map, RingsCam2MapForward,
    RingsCam2MapReverse, Transform,
};
pub use warp::{Strategy, cam2map, map2map, select_strategy, warp};
