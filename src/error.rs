//! Error types for Folio.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Folio operations.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Malformed, duplicate or otherwise invalid field definitions.
    #[error("Schema error: {0}")]
    Schema(String),

    /// An index already exists where a new one was requested.
    #[error("Index already exists at {}", .0.display())]
    PathConflict(PathBuf),

    /// No index (or no directory) exists where one was expected.
    #[error("No index found at {}", .0.display())]
    NotFound(PathBuf),

    /// A document does not conform to the schema of the index.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A writer session is already active on the handle.
    #[error("A writer session is already active on this index")]
    AlreadyActive,

    /// Operation on a disposed handle or on a session that can no longer write.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Failure reported by the underlying retrieval engine, verbatim.
    #[error("Engine error: {0}")]
    Engine(String),

    /// The query text could not be parsed.
    #[error("Query error: {0}")]
    Query(String),

    /// Filesystem failure outside the engine.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema or document text that is not valid JSON, or fails to encode.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Folio operations.
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    pub fn schema(msg: impl Into<String>) -> Self {
        FolioError::Schema(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        FolioError::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        FolioError::InvalidState(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        FolioError::Engine(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        FolioError::Query(msg.into())
    }

    /// Returns true if the error leaves the current session usable.
    ///
    /// Validation and engine failures on a single document do not poison the
    /// session; everything else either never reached the session or ended it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FolioError::Validation(_) | FolioError::Engine(_))
    }
}

impl From<tantivy::TantivyError> for FolioError {
    fn from(err: tantivy::TantivyError) -> Self {
        FolioError::Engine(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FolioError::PathConflict(PathBuf::from("/tmp/idx"));
        assert_eq!(err.to_string(), "Index already exists at /tmp/idx");

        let err = FolioError::validation("unknown field 'x'");
        assert_eq!(err.to_string(), "Validation error: unknown field 'x'");

        let err = FolioError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.to_string(), "IO error: disk gone");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(FolioError::validation("x").is_recoverable());
        assert!(FolioError::engine("x").is_recoverable());
        assert!(!FolioError::AlreadyActive.is_recoverable());
        assert!(!FolioError::invalid_state("x").is_recoverable());
    }
}
