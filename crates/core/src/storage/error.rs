use thiserror::Error;

use crate::item::ItemError;

/// Errors that can occur during repository operations.
///
/// Missing rows, failed preconditions and busy locks are ordinary results
/// (`None` / `false`), not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),
    #[error("Operation timed out: {0}")]
    Timeout(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Schema violation: {0}")]
    SchemaViolation(#[from] ItemError),
}

impl RepositoryError {
    /// Transport-level failures the caller may retry.
    ///
    /// A timed-out write may or may not have been applied; re-read before
    /// retrying it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
