//! Error types for prooflift.

use thiserror::Error;

/// Result type alias using prooflift's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur at the compiler-invocation boundary.
///
/// The translation pipeline itself is total and never returns these;
/// only [`crate::lean::check::LeanChecker`] does.
#[derive(Error, Debug)]
pub enum Error {
    /// Timeout during compiler invocation
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Subprocess communication error
    #[error("Subprocess communication error: {0}")]
    SubprocessComm(String),

    /// I/O error while writing or reading artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }
}
