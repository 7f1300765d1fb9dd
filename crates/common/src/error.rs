//! Error types shared with screen backends

use thiserror::Error;

/// Result type alias for backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Region algebra failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("regions are disjoint: {a} does not intersect {b}")]
    Disjoint { a: String, b: String },

    #[error("cannot build a bounding region from an empty set")]
    Empty,
}

/// Errors raised by a [`crate::Screen`] implementation
#[derive(Error, Debug)]
pub enum BackendError {
    /// The pattern did not appear within the allotted time
    #[error("{pattern} not found within {timeout_ms}ms")]
    NotFound { pattern: String, timeout_ms: u64 },

    #[error("backend does not support {0}")]
    Unsupported(&'static str),

    #[error("backend failure: {0}")]
    Failed(String),

    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// True for the ordinary "pattern is not on screen" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}
