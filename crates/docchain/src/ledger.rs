//! The Ledger: process-wide handle to one audit chain.
//!
//! The Ledger owns the store, the configuration and the single-writer lock.
//! Appends are serialized through the lock; reads never take it.

use std::path::Path;
use std::sync::Arc;

use docchain_core::{
    now, Block, ChainValidator, EventBuilder, PendingTransaction, Timestamp, Transaction, TxId,
    ValidationReport,
};
use docchain_store::{ChainEntry, SqliteStore, Store, StoredBlock};
use tokio::sync::Mutex;

use crate::builder::BlockBuilder;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::query::{self, AuditReport};

/// Blocks fetched per round trip while replaying the chain.
const VALIDATION_PAGE: u64 = 256;

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Recording document events as mined blocks
/// - Looking up blocks and transactions
/// - Document history and audit reports
/// - Replaying the chain to detect tampering
pub struct Ledger<S: Store> {
    store: Arc<S>,
    config: LedgerConfig,
    /// Held across read-head, mine and commit.
    writer: Mutex<()>,
}

impl Ledger<SqliteStore> {
    /// Open (or create) a SQLite-backed ledger at `path`.
    pub async fn open_path(path: impl AsRef<Path>, config: LedgerConfig) -> Result<Self> {
        let store = SqliteStore::open(path)?;
        Self::open(store, config).await
    }
}

impl<S: Store> Ledger<S> {
    /// Wrap `store`, creating the genesis block if the store is empty.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let ledger = Self {
            store: Arc::new(store),
            config,
            writer: Mutex::new(()),
        };
        ledger.ensure_genesis().await?;
        Ok(ledger)
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Create the genesis block unless the chain already has one.
    ///
    /// Returns `true` if a block was created.
    async fn ensure_genesis(&self) -> Result<bool> {
        let _guard = self.writer.lock().await;
        if self.store.head().await?.is_some() {
            return Ok(false);
        }

        let genesis = PendingTransaction::genesis(now())?;
        let block = BlockBuilder::new(self.store.as_ref(), &self.config)
            .commit(genesis)
            .await?;
        tracing::info!(
            data_hash = %block.data_hash,
            nonce = block.nonce,
            difficulty = block.difficulty,
            "created genesis block"
        );
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate and record a document event. Returns the new transaction id.
    ///
    /// Missing or blank operator and document ids are rejected with
    /// [`LedgerError::InvalidInput`] before anything is written.
    pub async fn record_event(&self, event: EventBuilder) -> Result<TxId> {
        let pending = event.build()?;
        let tx_id = pending.tx_id.clone();
        self.append(pending).await?;
        Ok(tx_id)
    }

    /// Mine `pending` into a new block and commit both atomically.
    ///
    /// Returns the new block number. On any failure nothing is persisted
    /// and the chain length is unchanged.
    pub async fn append(&self, pending: PendingTransaction) -> Result<u64> {
        if pending.is_genesis() {
            return Err(LedgerError::InvalidInput(
                "the genesis transaction cannot be appended".into(),
            ));
        }
        pending.validate()?;
        let _guard = self.writer.lock().await;
        let block = BlockBuilder::new(self.store.as_ref(), &self.config)
            .commit(pending)
            .await?;
        Ok(block.number)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The most recently committed block.
    pub async fn head(&self) -> Result<Option<Block>> {
        Ok(self.store.head().await?)
    }

    /// Number of committed blocks, genesis included.
    pub async fn chain_length(&self) -> Result<u64> {
        Ok(self.store.block_count().await?)
    }

    /// A block with the transactions it owns.
    pub async fn block(&self, number: u64) -> Result<Option<ChainEntry>> {
        let Some(block) = self.store.get_block(number).await? else {
            return Ok(None);
        };
        let transactions = self.store.transactions_for_block(number).await?;
        Ok(Some(ChainEntry {
            block,
            transactions,
        }))
    }

    /// Get a transaction by id.
    pub async fn transaction(&self, tx_id: &TxId) -> Result<Option<Transaction>> {
        Ok(self.store.get_transaction(tx_id).await?)
    }

    /// Every transaction on `document_id`, oldest first.
    pub async fn history_of(&self, document_id: &str) -> Result<Vec<Transaction>> {
        query::history_of(self.store.as_ref(), document_id).await
    }

    /// Tally operations with timestamps inside `[start, end]`.
    pub async fn report(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<AuditReport> {
        query::report(self.store.as_ref(), start, end).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Replay the stored chain from genesis. Never modifies the store.
    pub async fn validate(&self) -> Result<ValidationReport> {
        let mut validator = ChainValidator::new();
        let head = self.store.head().await?.map_or(0, |b| b.number);
        let mut start = 1;

        'pages: while start <= head {
            let end = start.saturating_add(VALIDATION_PAGE - 1);
            for stored in self.store.replay_range(start, end).await? {
                let more = match stored {
                    StoredBlock::Intact(entry) => {
                        validator.push(&entry.block, &entry.transactions)
                    }
                    StoredBlock::Undecodable { number, reason } => {
                        validator.push_undecodable(number, reason)
                    }
                };
                if !more {
                    break 'pages;
                }
            }
            start = end.saturating_add(1);
        }

        let report = validator.finish();
        match &report.first_violation {
            Some(violation) => tracing::warn!(
                block = violation.block_number,
                reason = %violation.reason,
                "chain validation failed"
            ),
            None => tracing::debug!(blocks = report.blocks_checked, "chain valid"),
        }
        Ok(report)
    }

    /// Like [`validate`](Self::validate), but a violation becomes an error.
    pub async fn ensure_valid(&self) -> Result<ValidationReport> {
        let report = self.validate().await?;
        match report.first_violation {
            Some(violation) => Err(LedgerError::Integrity(violation)),
            None => Ok(report),
        }
    }
}
