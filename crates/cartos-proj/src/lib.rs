//! cartos-proj - Map projections for the cartos cartography engine
//!
//! This crate provides:
//!
//! - [`TProjection`] - latitude/longitude projections over a shared
//!   [`ProjectionState`] (radii, conventions, ground range, rotation)
//! - [`RingProjection`] - ring-plane projections over [`RingState`]
//! - [`WorldMapper`] - pixel to projection coordinate mapping
//! - Concrete projections in [`projections`]
//! - [`ProjectionRegistry`] / [`ProjectionFactory`] - construction from a
//!   label's `Mapping` group and output raster sizing
//!
//! # Example
//!
//! ```ignore
//! use cartos_proj::ProjectionFactory;
//!
//! let factory = ProjectionFactory::default();
//! let sized = factory.create_for_cube(&mut label)?;
//! println!("{} x {}", sized.samples, sized.lines);
//! ```

mod error;
pub mod factory;
pub mod planetary;
pub mod projections;
pub mod registry;
pub mod ring;
pub mod snyder;
pub mod world;

pub use error::{ProjectionError, ProjectionResult};
pub use factory::{ProjectionFactory, SizedProjection};
pub use planetary::{LatLonRange, ProjectionState, TProjection, XYRange};
pub use projections::{
    Equirectangular, LambertAzimuthalEqualArea, LambertConformal, Mercator, Orthographic, Planar,
    PolarStereographic, RingCylindrical, SimpleCylindrical, Sinusoidal,
};
pub use registry::{
    Constructor, MapProjection, PlanetaryConstructor, ProjectionRegistry, RingConstructor,
};
pub use ring::{RingDirection, RingProjection, RingRange, RingState};
pub use world::WorldMapper;
