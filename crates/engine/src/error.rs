//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while running the index engine stages.
///
/// Data-quality gaps never surface here; they resolve to documented
/// defaults inside each stage. What remains is configuration rejected
/// up front.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid parameters: {0}")]
    Params(#[from] types::ParamsError),
}
