//! Error types for DocChain Core.

use thiserror::Error;

use crate::crypto::DataHash;

/// Core errors that can occur while building or hashing ledger data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("floating-point numbers are not allowed in canonical payloads")]
    UnsupportedFloat,

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("difficulty {0} is out of range (0..=64)")]
    InvalidDifficulty(u32),

    #[error("mining gave up after {attempts} attempts at difficulty {difficulty}")]
    MiningTimeout { attempts: u64, difficulty: u32 },
}

/// Reasons a stored block fails replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("hash mismatch: stored {stored}, recomputed {computed}")]
    HashMismatch { stored: DataHash, computed: DataHash },

    #[error("difficulty not met: {hash} has fewer than {difficulty} leading zeros")]
    DifficultyNotMet { hash: DataHash, difficulty: u32 },

    #[error("broken linkage: previous_hash {found}, expected {expected}")]
    BrokenLinkage { expected: DataHash, found: DataHash },

    #[error("block number gap: expected {expected}, found {found}")]
    NumberGap { expected: u64, found: u64 },

    #[error("merkle root {merkle_root} does not match data hash {data_hash}")]
    MerkleMismatch {
        merkle_root: DataHash,
        data_hash: DataHash,
    },

    #[error("block owns no transaction")]
    MissingTransaction,

    #[error("payload cannot be re-encoded: {0}")]
    Unencodable(String),

    #[error("stored block no longer decodes: {0}")]
    Undecodable(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
