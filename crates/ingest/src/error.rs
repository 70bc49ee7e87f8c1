//! Error types for snapshot ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors raised while discovering and loading run files.
///
/// A day file that cannot be read or parsed is fatal for that day and
/// propagates to the orchestrator; it is never silently dropped. Leniency
/// lives below this level, inside individual records.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("runs directory not found: {0}")]
    RunsDirNotFound(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {path}")]
    Record {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported JSON shape in {path}")]
    UnsupportedShape { path: PathBuf },
}
