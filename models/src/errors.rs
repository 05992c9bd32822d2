// models/src/errors.rs
use std::io;

use serde::{Deserialize, Serialize};
pub use thiserror::Error;

/// Error taxonomy shared by every crate in the workspace.
///
/// Each variant maps to one failure class the mutation API and the
/// merge/selection engines can surface. Handlers translate these into
/// HTTP statuses; library code never panics on bad input.
#[derive(Debug, Serialize, Deserialize, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("schema error: {0}")]
    Schema(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<io::Error> for GraphError {
    fn from(err: io::Error) -> Self {
        GraphError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Schema(format!("JSON error: {}", err))
    }
}

/// A type alias for a `Result` that returns a `GraphError` on failure.
pub type GraphResult<T> = Result<T, GraphError>;
