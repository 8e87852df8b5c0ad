//! Bounded proof-of-work search.

use crate::block::BlockPayload;
use crate::crypto::DataHash;
use crate::error::{CoreError, Result};

/// Highest meaningful difficulty: every hex character of the digest.
pub const MAX_DIFFICULTY: u32 = 64;

/// Outcome of a successful search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedBlock {
    pub nonce: u64,
    pub data_hash: DataHash,
    /// Digests computed, including the winning one.
    pub attempts: u64,
}

/// True if `hash` starts with at least `difficulty` hex zeros.
pub fn meets_difficulty(hash: &DataHash, difficulty: u32) -> bool {
    hash.leading_zero_nibbles() >= difficulty
}

/// Attempt budget for `difficulty`: `multiplier * 16^difficulty`, saturating.
pub fn attempt_ceiling(difficulty: u32, multiplier: u64) -> u64 {
    16u64
        .checked_pow(difficulty)
        .map_or(u64::MAX, |space| space.saturating_mul(multiplier))
}

/// Search nonces from 0 upward until the digest meets `difficulty`.
///
/// Fails with [`CoreError::MiningTimeout`] once `max_attempts` digests have
/// been computed without success.
pub fn mine(payload: &BlockPayload, difficulty: u32, max_attempts: u64) -> Result<MinedBlock> {
    if difficulty > MAX_DIFFICULTY {
        return Err(CoreError::InvalidDifficulty(difficulty));
    }
    let hasher = payload.hasher()?;

    for nonce in 0..max_attempts {
        let data_hash = hasher.digest(nonce);
        if meets_difficulty(&data_hash, difficulty) {
            return Ok(MinedBlock {
                nonce,
                data_hash,
                attempts: nonce + 1,
            });
        }
    }

    Err(CoreError::MiningTimeout {
        attempts: max_attempts,
        difficulty,
    })
}
