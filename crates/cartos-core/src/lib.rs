//! Cartos Core - data model for the planetary cartography engine
//!
//! This crate provides the types every other cartos crate builds on:
//!
//! - [`Label`] / [`Group`] / [`Keyword`] / [`Value`] - keyword/group labels and their text form
//! - [`Cube`] / [`RasterView`] - banded rasters with 1-based addressing
//! - [`pixel`] - special pixel markers (`NULL`, `LRS`, `LIS`, `HIS`, `HRS`)
//! - [`AlphaCube`] - crop bookkeeping between a cube and its original image
//! - [`Camera`] - the sensor model capability interface, with ground range helpers
//! - [`conventions`] - latitude type, longitude direction and domain conversions
//! - [`Error`] / [`ErrorKind`] - shared error classes and exit codes

pub mod alpha;
pub mod camera;
pub mod conventions;
pub mod cube;
pub mod error;
pub mod label;
pub mod pixel;

pub use alpha::AlphaCube;
pub use camera::{
    Camera, CameraType, GroundRange, GroundSurvey, PushFrameGeometry, Target, TilingHint,
};
pub use conventions::{LatitudeType, LongitudeDirection, LongitudeDomain};
pub use cube::{Blob, Cube, RasterView};
pub use error::{EXIT_UNSUPPORTED, Error, ErrorKind, Result};
pub use label::{Group, GroupKind, Keyword, Label, Value};
pub use pixel::PixelType;
