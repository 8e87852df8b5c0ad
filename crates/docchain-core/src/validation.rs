//! Chain replay: recompute every block and check linkage and difficulty.

use serde::Serialize;

use crate::block::Block;
use crate::crypto::DataHash;
use crate::error::IntegrityError;
use crate::mining::meets_difficulty;
use crate::transaction::{PendingTransaction, Transaction};

/// First block that failed replay, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub block_number: u64,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: IntegrityError,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &IntegrityError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Result of replaying a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Blocks examined, including the failing one if any.
    pub blocks_checked: u64,
    pub first_violation: Option<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.first_violation.is_none()
    }
}

/// Check one block against its transactions and its predecessor's hash.
///
/// Checks run in a fixed order and the first failure is returned:
/// 1. The block owns at least one transaction
/// 2. Recomputed payload digest equals the stored `data_hash`
/// 3. Stored `data_hash` meets the recorded difficulty
/// 4. `previous_hash` equals `expected_previous`
/// 5. `merkle_root` equals `data_hash`
pub fn validate_block(
    block: &Block,
    transactions: &[Transaction],
    expected_previous: &DataHash,
) -> Result<(), IntegrityError> {
    if transactions.is_empty() {
        return Err(IntegrityError::MissingTransaction);
    }

    let bodies: Vec<PendingTransaction> = transactions.iter().map(|tx| tx.body.clone()).collect();
    let computed = block
        .payload(bodies)
        .digest(block.nonce)
        .map_err(|e| IntegrityError::Unencodable(e.to_string()))?;
    if computed != block.data_hash {
        return Err(IntegrityError::HashMismatch {
            stored: block.data_hash,
            computed,
        });
    }

    if !meets_difficulty(&block.data_hash, block.difficulty) {
        return Err(IntegrityError::DifficultyNotMet {
            hash: block.data_hash,
            difficulty: block.difficulty,
        });
    }

    if block.previous_hash != *expected_previous {
        return Err(IntegrityError::BrokenLinkage {
            expected: *expected_previous,
            found: block.previous_hash,
        });
    }

    if block.merkle_root != block.data_hash {
        return Err(IntegrityError::MerkleMismatch {
            merkle_root: block.merkle_root,
            data_hash: block.data_hash,
        });
    }

    Ok(())
}

/// Incremental validator fed blocks in ascending number order.
///
/// Stops recording after the first violation; later pushes are ignored.
#[derive(Debug, Clone)]
pub struct ChainValidator {
    expected_number: u64,
    previous_hash: DataHash,
    checked: u64,
    violation: Option<Violation>,
}

impl Default for ChainValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainValidator {
    pub fn new() -> Self {
        Self {
            expected_number: 1,
            previous_hash: DataHash::ZERO,
            checked: 0,
            violation: None,
        }
    }

    /// Feed the next block. Returns `false` once a violation has been found.
    pub fn push(&mut self, block: &Block, transactions: &[Transaction]) -> bool {
        if self.violation.is_some() {
            return false;
        }
        self.checked += 1;

        let result = self
            .check_number(block.number)
            .and_then(|()| validate_block(block, transactions, &self.previous_hash));

        match result {
            Ok(()) => {
                self.expected_number += 1;
                self.previous_hash = block.data_hash;
                true
            }
            Err(reason) => self.record(block.number, reason),
        }
    }

    /// Feed a stored block whose values could not be decoded.
    ///
    /// A number gap before it is still reported as the gap.
    pub fn push_undecodable(&mut self, number: u64, reason: impl Into<String>) -> bool {
        if self.violation.is_some() {
            return false;
        }
        self.checked += 1;

        let reason = match self.check_number(number) {
            Err(gap) => gap,
            Ok(()) => IntegrityError::Undecodable(reason.into()),
        };
        self.record(number, reason)
    }

    fn check_number(&self, number: u64) -> Result<(), IntegrityError> {
        if number == self.expected_number {
            Ok(())
        } else {
            Err(IntegrityError::NumberGap {
                expected: self.expected_number,
                found: number,
            })
        }
    }

    fn record(&mut self, block_number: u64, reason: IntegrityError) -> bool {
        self.violation = Some(Violation {
            block_number,
            reason,
        });
        false
    }

    pub fn finish(self) -> ValidationReport {
        ValidationReport {
            blocks_checked: self.checked,
            first_violation: self.violation,
        }
    }
}

/// Replay a whole chain held in memory.
pub fn validate_chain<'a, I>(blocks: I) -> ValidationReport
where
    I: IntoIterator<Item = (&'a Block, &'a [Transaction])>,
{
    let mut validator = ChainValidator::new();
    for (block, txs) in blocks {
        if !validator.push(block, txs) {
            break;
        }
    }
    validator.finish()
}
