//! Store trait: the abstract interface for ledger persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use docchain_core::{Block, DataHash, Timestamp, Transaction, TxId};

use crate::error::{Result, StoreError};

/// A block together with the transactions it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub block: Block,
    pub transactions: Vec<Transaction>,
}

/// A stored block as read back for chain replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredBlock {
    /// The block and its transactions decoded cleanly.
    Intact(ChainEntry),
    /// Block `number`, or a transaction it owns, holds a value that no
    /// longer decodes.
    Undecodable { number: u64, reason: String },
}

/// The Store trait: async interface for ledger persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Append-only**: blocks and transactions are never updated or deleted.
/// - **Atomic append**: a block and its transaction are committed together
///   or not at all.
/// - **Head guard**: `append_block` rejects a block that does not extend the
///   current head with [`StoreError::HeadMismatch`].
/// - **Ordering**: transaction lists are ordered by timestamp, then block
///   number.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Chain Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The most recently committed block, or `None` for an empty store.
    async fn head(&self) -> Result<Option<Block>>;

    /// Number of committed blocks.
    async fn block_count(&self) -> Result<u64>;

    /// Commit a block and the transaction it owns as one atomic unit.
    ///
    /// # Errors
    /// - `HeadMismatch` if `block.number` is not head + 1 or
    ///   `block.previous_hash` is not the head's `data_hash`.
    /// - `DuplicateTransaction` if the transaction id is already taken.
    /// - `InvalidData` if the transaction is not assigned to `block`.
    async fn append_block(&self, block: &Block, transaction: &Transaction) -> Result<()>;

    /// Get a block by number.
    async fn get_block(&self, number: u64) -> Result<Option<Block>>;

    /// Blocks with `start <= number <= end` and their transactions, ordered
    /// by number.
    async fn chain_range(&self, start: u64, end: u64) -> Result<Vec<ChainEntry>>;

    /// Like [`chain_range`](Store::chain_range), but a row that fails to
    /// decode is returned as [`StoredBlock::Undecodable`] instead of failing
    /// the whole read.
    async fn replay_range(&self, start: u64, end: u64) -> Result<Vec<StoredBlock>> {
        let entries = self.chain_range(start, end).await?;
        Ok(entries.into_iter().map(StoredBlock::Intact).collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transaction Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a transaction by id.
    async fn get_transaction(&self, tx_id: &TxId) -> Result<Option<Transaction>>;

    /// Transactions owned by a block.
    async fn transactions_for_block(&self, number: u64) -> Result<Vec<Transaction>>;

    /// All transactions on `document_id`.
    async fn transactions_for_document(&self, document_id: &str) -> Result<Vec<Transaction>>;

    /// Transactions with `start <= timestamp <= end`; a missing bound is open.
    async fn transactions_between(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<Transaction>>;
}

/// Check that `block` extends `head` and owns `transaction`.
///
/// Shared by the backends so both enforce identical rules.
pub(crate) fn check_append(
    head: Option<(u64, DataHash)>,
    block: &Block,
    transaction: &Transaction,
) -> Result<()> {
    let (expected_number, expected_previous) = match head {
        Some((number, hash)) => (number + 1, hash),
        None => (1, DataHash::ZERO),
    };
    if block.number != expected_number || block.previous_hash != expected_previous {
        return Err(StoreError::HeadMismatch {
            expected_number,
            expected_previous,
            number: block.number,
            previous: block.previous_hash,
        });
    }
    if transaction.block_number != block.number {
        return Err(StoreError::InvalidData(format!(
            "transaction {} assigned to block {}, committing block {}",
            transaction.tx_id(),
            transaction.block_number,
            block.number
        )));
    }
    Ok(())
}
