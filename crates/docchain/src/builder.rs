//! Block building: read the head, mine a block on top of it, commit.
//!
//! Callers must hold the ledger's writer lock for the whole of
//! [`BlockBuilder::commit`]; the store's head guard catches writers in other
//! processes.

use docchain_core::{mine, now, Block, BlockPayload, CoreError, DataHash, PendingTransaction};
use docchain_store::Store;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};

pub(crate) struct BlockBuilder<'a, S: Store> {
    store: &'a S,
    config: &'a LedgerConfig,
}

impl<'a, S: Store> BlockBuilder<'a, S> {
    pub(crate) fn new(store: &'a S, config: &'a LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Mine `pending` into the next block and persist it with its transaction.
    pub(crate) async fn commit(&self, pending: PendingTransaction) -> Result<Block> {
        let (number, previous_hash) = match self.store.head().await? {
            Some(head) => (head.number + 1, head.data_hash),
            None => (1, DataHash::ZERO),
        };

        // Genesis carries its own creation time as the block time.
        let timestamp = if pending.is_genesis() {
            pending.timestamp
        } else {
            now()
        };
        let payload = BlockPayload::new(previous_hash, timestamp, pending.clone());

        let difficulty = self.config.difficulty;
        let max_attempts = self.config.max_attempts();
        let mined = {
            let payload = payload.clone();
            tokio::task::spawn_blocking(move || mine(&payload, difficulty, max_attempts))
                .await
                .map_err(|e| LedgerError::Task(e.to_string()))?
        };
        let mined = mined.map_err(|e| {
            if matches!(e, CoreError::MiningTimeout { .. }) {
                tracing::warn!(block = number, difficulty, max_attempts, "mining timed out");
            }
            LedgerError::from(e)
        })?;

        let miner = self.config.miner.as_str();
        let block = Block::from_mined(number, &payload, &mined, difficulty, miner);
        let transaction = pending.commit(number);
        self.store.append_block(&block, &transaction).await?;

        tracing::debug!(
            block = number,
            nonce = mined.nonce,
            attempts = mined.attempts,
            data_hash = %block.data_hash,
            "mined block"
        );
        Ok(block)
    }
}
