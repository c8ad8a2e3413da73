//! Error types for cartos-core
//!
//! Every failure in the engine carries an [`ErrorKind`] so that front ends
//! can map it onto a process exit status without inspecting messages.
//! Messages are worded for the person running the tool; they name the
//! offending keyword, group, file or value.

use thiserror::Error;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input supplied by the user (parameters, labels, files)
    User,
    /// Internal misuse or an unexpected state
    Programmer,
    /// Reading or writing external data failed
    Io,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// Process exit status for this kind, always non-zero.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::User => 1,
            ErrorKind::Programmer => 2,
            ErrorKind::Io => 3,
            ErrorKind::Unknown => 4,
        }
    }
}

/// Exit status reserved for a configuration the engine does not support
/// (for example an unknown projection name).
pub const EXIT_UNSUPPORTED: i32 = 5;

/// cartos-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A required keyword is absent from a label group
    #[error("Unable to find keyword [{keyword}] in group [{group}]")]
    MissingKeyword { group: String, keyword: String },

    /// A required group is absent from a label
    #[error("Unable to find group [{0}]")]
    MissingGroup(String),

    /// A keyword is present but its value is not usable
    #[error("Invalid value [{value}] for keyword [{keyword}]: {reason}")]
    InvalidKeyword {
        keyword: String,
        value: String,
        reason: String,
    },

    /// Malformed label text
    #[error("label parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Invalid raster dimensions
    #[error("invalid cube dimensions: {samples} samples x {lines} lines x {bands} bands")]
    InvalidDimension {
        samples: usize,
        lines: usize,
        bands: usize,
    },

    /// Pixel or band position outside a raster
    #[error("position out of bounds: sample {sample}, line {line}, band {band}")]
    OutOfBounds {
        sample: usize,
        line: usize,
        band: usize,
    },

    /// Invalid parameter value supplied by the caller
    #[error("{0}")]
    User(String),

    /// Internal misuse
    #[error("{0}")]
    Programmer(String),

    /// The camera never intersected the target body
    #[error("Camera missed planet or SPICE data off")]
    CameraMissedTarget,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classification used for exit codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingKeyword { .. }
            | Error::MissingGroup(_)
            | Error::InvalidKeyword { .. }
            | Error::Parse { .. }
            | Error::InvalidDimension { .. }
            | Error::User(_)
            | Error::CameraMissedTarget => ErrorKind::User,
            Error::OutOfBounds { .. } | Error::Programmer(_) => ErrorKind::Programmer,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Shorthand for [`Error::MissingKeyword`].
    pub fn missing_keyword(group: &str, keyword: &str) -> Self {
        Error::MissingKeyword {
            group: group.to_string(),
            keyword: keyword.to_string(),
        }
    }

    /// Shorthand for [`Error::InvalidKeyword`].
    pub fn invalid_keyword(keyword: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Error::InvalidKeyword {
            keyword: keyword.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for cartos-core operations
pub type Result<T> = std::result::Result<T, Error>;
