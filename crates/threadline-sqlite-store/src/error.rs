//! Error types for the SQLite store implementation.

use rusqlite::ErrorCode;
use threadline_store_traits::StoreError;

/// Error type for SQLite store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// SQLite database error
    #[error("Database error: {0}")]
    Database(String),
    /// Error from rusqlite
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    /// Error during database migration
    #[error("Migration error: {0}")]
    Refinery(#[from] refinery::Error),
}

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        match err {
            Error::Rusqlite(e) => into_store_err(e),
            Error::Refinery(e) => StoreError::Unavailable(e.to_string()),
            Error::Database(e) => StoreError::Database(e),
        }
    }
}

/// Maps a rusqlite error onto the store taxonomy.
///
/// Failures that mean "the database cannot be reached right now" become
/// [`StoreError::Unavailable`]; everything else is a plain database error.
pub(crate) fn into_store_err(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::NotADatabase
            ) =>
        {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}
