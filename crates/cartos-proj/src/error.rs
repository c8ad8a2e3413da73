//! Error types for cartos-proj

use cartos_core::{EXIT_UNSUPPORTED, ErrorKind};
use thiserror::Error;

/// Errors raised while building or sizing a projection
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] cartos_core::Error),

    /// No projection is registered under this name
    #[error("Unsupported projection, unable to find plugin for [{name}]")]
    Unsupported { name: String },

    /// The mapping group is unusable for this projection
    #[error("Invalid label group [Mapping]: {0}")]
    InvalidMapping(String),

    /// The ground range does not produce a usable raster
    #[error("Invalid ground range [MinimumLatitude,MaximumLatitude,MinimumLongitude,MaximumLongitude]: {0}")]
    InvalidGroundRange(String),

    /// An iterative computation did not converge
    #[error("{0}")]
    Computation(String),
}

impl ProjectionError {
    /// Classification used for exit codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProjectionError::Core(e) => e.kind(),
            ProjectionError::Unsupported { .. }
            | ProjectionError::InvalidMapping(_)
            | ProjectionError::InvalidGroundRange(_) => ErrorKind::User,
            ProjectionError::Computation(_) => ErrorKind::Unknown,
        }
    }

    /// Process exit status; unknown projections get their own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProjectionError::Unsupported { .. } => EXIT_UNSUPPORTED,
            other => other.kind().exit_code(),
        }
    }

    pub(crate) fn mapping(err: impl std::fmt::Display) -> Self {
        ProjectionError::InvalidMapping(err.to_string())
    }
}

/// Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;
