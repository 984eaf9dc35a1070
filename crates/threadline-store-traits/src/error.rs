//! Error types for store operations

use thiserror::Error;

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached (closed, locked, I/O failure)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(String),

    /// Requested item was not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller passed something the store cannot accept
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
