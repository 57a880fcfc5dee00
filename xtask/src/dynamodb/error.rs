//! Error types for DynamoDB operations.

use itemstore_core::storage::RepositoryError;
use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB operations.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Table '{table_name}' not found")]
    TableNotFound { table_name: String },

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Timeout waiting for table '{table_name}' to become active")]
    TableActivationTimeout { table_name: String },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Wraps any displayable SDK failure.
pub fn sdk_error(err: impl std::fmt::Display) -> DynamodbError {
    DynamodbError::AwsSdk(err.to_string())
}
