//! Error types for cartos-geom

use crate::ops::Operation;
use cartos_core::{EXIT_UNSUPPORTED, ErrorKind};
use cartos_proj::ProjectionError;
use thiserror::Error;

/// Errors raised by polygon operations and footprint computation
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] cartos_core::Error),

    /// Projection construction failed
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Spike removal left an invalid or badly shrunken polygon
    #[error("Despike failed to correct the polygon: {0}")]
    Despike(String),

    /// Vertex repair failed
    #[error("Failed when attempting to fix {0}")]
    Fix(String),

    /// A set operation failed at every precision
    #[error("Operation [{op}] failed: {reason}")]
    Operation { op: Operation, reason: String },

    /// Coordinates could not be moved between coordinate systems
    #[error("Unable to convert polygon from {from} to {to}")]
    Conversion { from: &'static str, to: &'static str },

    /// Geometry type the toolkit does not handle
    #[error("PolygonTools does not support [{geometry}]")]
    Unsupported { geometry: String },

    /// Malformed well-known text
    #[error("invalid WKT at offset {offset}: {message}")]
    Wkt { offset: usize, message: String },

    /// No footprint could be traced for the image
    #[error("{0}")]
    Footprint(String),
}

impl GeometryError {
    /// Classification used for exit codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeometryError::Core(e) => e.kind(),
            GeometryError::Projection(e) => e.kind(),
            GeometryError::Despike(_)
            | GeometryError::Fix(_)
            | GeometryError::Operation { .. } => ErrorKind::Programmer,
            GeometryError::Conversion { .. } => ErrorKind::Unknown,
            GeometryError::Unsupported { .. }
            | GeometryError::Wkt { .. }
            | GeometryError::Footprint(_) => ErrorKind::User,
        }
    }

    /// Process exit status; unsupported geometry types get their own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            GeometryError::Projection(e) => e.exit_code(),
            GeometryError::Unsupported { .. } => EXIT_UNSUPPORTED,
            other => other.kind().exit_code(),
        }
    }
}

/// Result type for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;
