//! Test harness errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestError {
    /// A regression output or golden file could not be written
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A fixture could not be built
    #[error("fixture error: {0}")]
    Fixture(#[from] cartos_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TestResult<T> = Result<T, TestError>;
