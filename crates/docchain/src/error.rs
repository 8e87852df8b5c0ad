//! Error types for the Ledger.

use docchain_core::{CoreError, Violation};
use docchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Rejected before anything was written.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Replay found a block that fails validation.
    #[error("integrity violation at block {}: {}", .0.block_number, .0.reason)]
    Integrity(Violation),

    /// Proof-of-work exhausted its attempt ceiling.
    #[error("mining gave up after {attempts} attempts at difficulty {difficulty}")]
    MiningTimeout { attempts: u64, difficulty: u32 },

    /// Canonical encoding failed.
    #[error("canonical encoding error: {0}")]
    Canonical(CoreError),

    /// Bad configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Background mining task failed.
    #[error("mining task failed: {0}")]
    Task(String),
}

impl LedgerError {
    /// Whether repeating the same call may succeed.
    ///
    /// A mining timeout can succeed with a later block timestamp; a head
    /// mismatch means another writer got there first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::MiningTimeout { .. } | LedgerError::Store(StoreError::HeadMismatch { .. })
        )
    }
}

impl From<CoreError> for LedgerError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidInput(msg) => LedgerError::InvalidInput(msg),
            CoreError::UnknownAction(action) => {
                LedgerError::InvalidInput(format!("unknown action: {action}"))
            }
            CoreError::InvalidTimestamp(ts) => {
                LedgerError::InvalidInput(format!("invalid timestamp: {ts}"))
            }
            CoreError::MiningTimeout {
                attempts,
                difficulty,
            } => LedgerError::MiningTimeout {
                attempts,
                difficulty,
            },
            CoreError::InvalidDifficulty(d) => {
                LedgerError::Config(format!("difficulty {d} is out of range (0..=64)"))
            }
            other => LedgerError::Canonical(other),
        }
    }
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_taxonomy() {
        assert!(matches!(
            LedgerError::from(CoreError::InvalidInput("x".into())),
            LedgerError::InvalidInput(_)
        ));
        assert!(matches!(
            LedgerError::from(CoreError::UnknownAction("drop".into())),
            LedgerError::InvalidInput(_)
        ));
        assert!(matches!(
            LedgerError::from(CoreError::UnsupportedFloat),
            LedgerError::Canonical(_)
        ));
    }

    #[test]
    fn test_retryable() {
        let timeout = LedgerError::from(CoreError::MiningTimeout {
            attempts: 10,
            difficulty: 4,
        });
        assert!(timeout.is_retryable());
        assert!(!LedgerError::InvalidInput("x".into()).is_retryable());
        assert!(!LedgerError::Config("x".into()).is_retryable());
    }
}
