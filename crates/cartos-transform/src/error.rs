//! Error types for cartos-transform

use cartos_core::ErrorKind;
use cartos_proj::ProjectionError;
use thiserror::Error;

/// Errors raised while setting up or running a warp
#[derive(Debug, Error)]
pub enum TransformError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] cartos_core::Error),

    /// Projection construction or sizing failed
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// A push-frame cube cropped part way through a line cannot be
    /// aligned with its framelets
    #[error("Input file is a pushframe camera cropped at a fractional pixel. Can not project")]
    FractionalCrop { alpha_line: f64 },

    /// The image crosses the longitude seam of the output mapping
    #[error("The image [{file}] crosses the longitude seam")]
    LongitudeSeam { file: String },

    /// Unknown warp algorithm or interpolator name
    #[error("Unknown value for {parameter} [{value}]")]
    UnknownOption { parameter: String, value: String },

    /// Invalid rubber-sheet parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Output longitudes could not be ordered after a convention change
    #[error(
        "Unable to determine the correct [MinimumLongitude,MaximumLongitude]; specify them explicitly"
    )]
    UnorderedLongitudes,
}

impl TransformError {
    /// Classification used for exit codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Core(e) => e.kind(),
            TransformError::Projection(e) => e.kind(),
            TransformError::FractionalCrop { .. }
            | TransformError::LongitudeSeam { .. }
            | TransformError::UnorderedLongitudes => ErrorKind::User,
            TransformError::UnknownOption { .. } | TransformError::InvalidParameters(_) => {
                ErrorKind::Programmer
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            TransformError::Projection(e) => e.exit_code(),
            other => other.kind().exit_code(),
        }
    }
}

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
