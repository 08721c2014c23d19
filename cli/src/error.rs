//! Error types for the catalog-search CLI.

use catalog_search::SearchError;
use thiserror::Error;

/// Errors that can occur while running a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The encoder could not be loaded or did not answer in time.
    #[error("Search unavailable: {0}")]
    Unavailable(String),

    #[error("Search error: {0}")]
    Search(SearchError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SearchError> for CliError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EncodingUnavailable(msg) => CliError::Unavailable(msg),
            other => CliError::Search(other),
        }
    }
}

impl CliError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Unavailable(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
