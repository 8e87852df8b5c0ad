//! Error types for the store module.

use docchain_core::{CoreError, DataHash};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The block does not extend the current head.
    #[error(
        "head mismatch: expected block {expected_number} after {expected_previous}, \
         got block {number} after {previous}"
    )]
    HeadMismatch {
        expected_number: u64,
        expected_previous: DataHash,
        number: u64,
        previous: DataHash,
    },

    /// A transaction with this id is already committed.
    #[error("duplicate transaction id: {0}")]
    DuplicateTransaction(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding store state was poisoned by a panicking holder.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// Background task failed to complete.
    #[error("blocking task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
