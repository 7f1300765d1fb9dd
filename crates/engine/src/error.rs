//! Error types for entity resolution

use std::path::PathBuf;
use std::time::Duration;

use sightline_common::{BackendError, GeometryError};
use thiserror::Error;

/// Result type alias using the engine [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No baseline file exists for any stem/layout combination
    #[error("baseline image missing for {entity}: last tried stem={stem} state={state:?}")]
    ImageMissing {
        entity: String,
        stem: String,
        state: Option<String>,
    },

    /// A single matching attempt failed on every series; retried by the finder
    #[error("image search exhausted for {entity} on attempt {attempt}")]
    ImageSearchExhausted { entity: String, attempt: u32 },

    #[error(
        "find exhausted: entity={entity} timeout={}ms elapsed={}ms attempts={attempts}",
        .timeout.as_millis(),
        .elapsed.as_millis()
    )]
    FindExhausted {
        entity: String,
        timeout: Duration,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("failed to validate {entity}: {source}")]
    UpdateFailure {
        entity: String,
        #[source]
        source: Box<Error>,
    },

    #[error("key [{query}] not found among {candidates:?}")]
    KeyNotFound {
        query: String,
        candidates: Vec<String>,
    },

    #[error("key [{query}] is ambiguous, matches {matches:?}")]
    AmbiguousKey { query: String, matches: Vec<String> },

    #[error("key [{key}] is not declared by {entity}")]
    NotInContext { key: String, entity: String },

    #[error("{entity} did not reach state [{state}]")]
    StateFailed { entity: String, state: String },

    #[error("{entity} took longer than {}ms to vanish", .timeout.as_millis())]
    TookTooLongToVanish { entity: String, timeout: Duration },

    #[error("{entity} took longer than {}ms to appear", .timeout.as_millis())]
    TookTooLongToAppear { entity: String, timeout: Duration },

    #[error("{entity} is not clickable")]
    NotClickable { entity: String },

    #[error("{entity} does not support {capability}")]
    MissingCapability {
        entity: String,
        capability: &'static str,
    },

    #[error("{entity} has no parent")]
    NoParent { entity: String },

    #[error("operator {operator} cannot transform a {operand}")]
    OperandMismatch {
        operator: String,
        operand: &'static str,
    },

    #[error("no previous matches or parent region to build from")]
    NoPreviousMatches,

    #[error("ancestor {depth} levels above the entity has no region yet")]
    UnresolvedParentRegion { depth: usize },

    #[error("({x}, {y}) lies outside the drawable area of {entity}")]
    OffCanvas { entity: String, x: i32, y: i32 },

    #[error("{entity} did not change appearance after press")]
    VisualChangeMissing { entity: String },

    #[error("{entity} text mismatch: expected {expected:?}, found {actual:?}")]
    TextMismatch {
        entity: String,
        expected: String,
        actual: String,
    },

    #[error("baseline not provided, captured {} for manual review", .path.display())]
    BaselineCaptured { path: PathBuf },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl Error {
    /// True when the error means the entity could not be found in time,
    /// whether raised directly or wrapped by validation
    pub fn is_find_exhausted(&self) -> bool {
        match self {
            Error::FindExhausted { .. } => true,
            Error::UpdateFailure { source, .. } => source.is_find_exhausted(),
            _ => false,
        }
    }

    pub fn is_search_error(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. } | Error::AmbiguousKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_exhausted_seen_through_update_failure() {
        let inner = Error::FindExhausted {
            entity: "Notebook:Application".into(),
            timeout: Duration::from_secs(1),
            elapsed: Duration::from_millis(1010),
            attempts: 3,
        };
        let wrapped = Error::UpdateFailure {
            entity: "Notebook:Application".into(),
            source: Box::new(inner),
        };
        assert!(wrapped.is_find_exhausted());
        assert!(wrapped.to_string().contains("attempts=3"));
    }

    #[test]
    fn test_image_missing_message_names_stem() {
        let err = Error::ImageMissing {
            entity: "Notebook,save:Button".into(),
            stem: "Button".into(),
            state: Some("disabled".into()),
        };
        assert!(err.to_string().contains("stem=Button"));
    }
}
