//! Database error types

use thiserror::Error;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: i64, required: i64 },
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
