//! Error types for catalog-search

use thiserror::Error;

/// Errors that can occur while encoding or ranking catalog items
#[derive(Debug, Error)]
pub enum SearchError {
    /// The encoder could not be constructed, failed to run, or timed out.
    /// Callers should surface this as "search unavailable".
    #[error("Encoding unavailable: {0}")]
    EncodingUnavailable(String),

    /// Two vectors of different dimension were compared
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector contents are not usable (non-finite values, corrupt blob)
    #[error("Malformed vector: {0}")]
    MalformedVector(String),

    /// Stored vector (de)serialization error (bincode)
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingUnavailable(msg.into())
    }

    /// Create a malformed vector error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedVector(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error means the search subsystem is down, as opposed to
    /// a problem with one particular input.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::EncodingUnavailable(_))
    }
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
