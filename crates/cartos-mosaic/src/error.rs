//! Error types for cartos-mosaic

use cartos_core::ErrorKind;
use cartos_geom::GeometryError;
use cartos_proj::ProjectionError;
use thiserror::Error;

/// Errors raised by overlap enumeration, mosaic placement and stitching
#[derive(Debug, Error)]
pub enum MosaicError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] cartos_core::Error),

    /// Projection construction failed
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Polygon operation failed
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// The input lies entirely outside the mosaic
    #[error("The input cube does not overlap the mosaic")]
    NoOverlap,

    /// `BandBin` groups of the input and mosaic disagree
    #[error("{0}")]
    BandBin(String),

    /// Origin tracking cannot be used as requested
    #[error("{0}")]
    Tracking(String),

    /// The band named for band priority does not exist
    #[error("Invalid Band / Key Name, Value [{0}]")]
    BandSelection(String),

    /// Map-projected inputs do not share a projection
    #[error("Mapping groups do not match between cube [{input}] and [{other}]")]
    MappingMismatch { input: String, other: String },

    /// Overlap enumeration gave up on a pair
    #[error("{description}: {message}")]
    Overlap { description: String, message: String },

    /// Malformed overlap list text
    #[error("The overlap file [{file}] does not contain a valid list of image overlaps: {reason}")]
    OverlapList { file: String, reason: String },

    /// Framelets cannot be stitched or a stitched cube cannot be split
    #[error("{0}")]
    Stitch(String),

    /// Caller misuse
    #[error("{0}")]
    Programmer(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MosaicError {
    /// Classification used for exit codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MosaicError::Core(e) => e.kind(),
            MosaicError::Projection(e) => e.kind(),
            MosaicError::Geometry(e) => e.kind(),
            MosaicError::NoOverlap
            | MosaicError::BandBin(_)
            | MosaicError::BandSelection(_)
            | MosaicError::MappingMismatch { .. }
            | MosaicError::OverlapList { .. }
            | MosaicError::Stitch(_) => ErrorKind::User,
            MosaicError::Tracking(_) | MosaicError::Overlap { .. } | MosaicError::Programmer(_) => {
                ErrorKind::Programmer
            }
            MosaicError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            MosaicError::Projection(e) => e.exit_code(),
            MosaicError::Geometry(e) => e.exit_code(),
            other => other.kind().exit_code(),
        }
    }
}

/// Result type for mosaic operations
pub type MosaicResult<T> = Result<T, MosaicError>;
