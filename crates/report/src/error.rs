//! Error types for exporters.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while writing export artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
