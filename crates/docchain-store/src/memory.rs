//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use docchain_core::{Block, Timestamp, Transaction, TxId};

use crate::error::{Result, StoreError};
use crate::traits::{check_append, ChainEntry, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Blocks indexed by number.
    blocks: BTreeMap<u64, Block>,

    /// Transactions indexed by owning block.
    transactions: BTreeMap<u64, Vec<Transaction>>,

    /// tx_id -> owning block number.
    tx_index: HashMap<TxId, u64>,
}

impl MemoryStoreInner {
    fn all_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values().flatten()
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(format!("memory store: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(format!("memory store: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp order with block number as tie-breaker, matching SQLite.
fn sorted(mut txs: Vec<Transaction>) -> Vec<Transaction> {
    txs.sort_by(|a, b| {
        a.timestamp()
            .cmp(b.timestamp())
            .then(a.block_number.cmp(&b.block_number))
    });
    txs
}

#[async_trait]
impl Store for MemoryStore {
    async fn head(&self) -> Result<Option<Block>> {
        Ok(self.read()?.blocks.values().next_back().cloned())
    }

    async fn block_count(&self) -> Result<u64> {
        Ok(self.read()?.blocks.len() as u64)
    }

    async fn append_block(&self, block: &Block, transaction: &Transaction) -> Result<()> {
        let mut inner = self.write()?;

        let head = inner
            .blocks
            .values()
            .next_back()
            .map(|b| (b.number, b.data_hash));
        check_append(head, block, transaction)?;

        if inner.tx_index.contains_key(transaction.tx_id()) {
            return Err(StoreError::DuplicateTransaction(
                transaction.tx_id().to_string(),
            ));
        }

        inner.blocks.insert(block.number, block.clone());
        inner
            .transactions
            .entry(block.number)
            .or_default()
            .push(transaction.clone());
        inner
            .tx_index
            .insert(transaction.tx_id().clone(), block.number);

        tracing::debug!(block = block.number, tx_id = %transaction.tx_id(), "committed block");
        Ok(())
    }

    async fn get_block(&self, number: u64) -> Result<Option<Block>> {
        Ok(self.read()?.blocks.get(&number).cloned())
    }

    async fn chain_range(&self, start: u64, end: u64) -> Result<Vec<ChainEntry>> {
        if start > end {
            return Ok(Vec::new());
        }
        let inner = self.read()?;
        Ok(inner
            .blocks
            .range(start..=end)
            .map(|(number, block)| ChainEntry {
                block: block.clone(),
                transactions: inner.transactions.get(number).cloned().unwrap_or_default(),
            })
            .collect())
    }

    async fn get_transaction(&self, tx_id: &TxId) -> Result<Option<Transaction>> {
        let inner = self.read()?;
        let Some(number) = inner.tx_index.get(tx_id) else {
            return Ok(None);
        };
        Ok(inner
            .transactions
            .get(number)
            .and_then(|txs| txs.iter().find(|tx| tx.tx_id() == tx_id))
            .cloned())
    }

    async fn transactions_for_block(&self, number: u64) -> Result<Vec<Transaction>> {
        let inner = self.read()?;
        Ok(sorted(
            inner.transactions.get(&number).cloned().unwrap_or_default(),
        ))
    }

    async fn transactions_for_document(&self, document_id: &str) -> Result<Vec<Transaction>> {
        let inner = self.read()?;
        Ok(sorted(
            inner
                .all_transactions()
                .filter(|tx| tx.document_id() == Some(document_id))
                .cloned()
                .collect(),
        ))
    }

    async fn transactions_between(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<Transaction>> {
        let inner = self.read()?;
        Ok(sorted(
            inner
                .all_transactions()
                .filter(|tx| start.map_or(true, |s| *tx.timestamp() >= s))
                .filter(|tx| end.map_or(true, |e| *tx.timestamp() <= e))
                .cloned()
                .collect(),
        ))
    }
}
