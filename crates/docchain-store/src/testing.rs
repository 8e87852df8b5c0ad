//! Shared fixtures and a behaviour suite every backend must pass.

use chrono::Duration;
use docchain_core::{
    mine, parse_timestamp, Action, Block, BlockPayload, DataHash, EventBuilder,
    PendingTransaction, Timestamp, Transaction, MINER,
};

pub(crate) fn at(seconds: i64) -> Timestamp {
    parse_timestamp("2025-01-01T00:00:00Z").unwrap() + Duration::seconds(seconds)
}

pub(crate) fn event(
    document: &str,
    operator: &str,
    action: Action,
    ts: Timestamp,
) -> PendingTransaction {
    EventBuilder::new(action)
        .operator(operator)
        .certificate("SHA1:AA:BB")
        .document(document)
        .summary(format!("{action} {document}"))
        .timestamp(ts)
        .build()
        .unwrap()
}

/// Mine `pending` at difficulty 0 on top of `previous`.
pub(crate) fn entry(
    number: u64,
    previous: DataHash,
    pending: PendingTransaction,
) -> (Block, Transaction) {
    let payload = BlockPayload::new(previous, pending.timestamp, pending.clone());
    let mined = mine(&payload, 0, 1).unwrap();
    let block = Block::from_mined(number, &payload, &mined, 0, MINER);
    (block, pending.commit(number))
}

/// Genesis followed by `len - 1` events alternating between two documents.
pub(crate) fn chain_of(len: u64) -> Vec<(Block, Transaction)> {
    let mut out: Vec<(Block, Transaction)> = Vec::new();
    for number in 1..=len {
        let previous = out.last().map_or(DataHash::ZERO, |(b, _)| b.data_hash);
        let ts = at(number as i64 * 10);
        let pending = if number == 1 {
            PendingTransaction::genesis(ts).unwrap()
        } else {
            let doc = if number % 2 == 0 { "DOC-A" } else { "DOC-B" };
            event(doc, "op-1", Action::Export, ts)
        };
        out.push(entry(number, previous, pending));
    }
    out
}

pub(crate) mod conformance {
    use super::*;
    use crate::error::StoreError;
    use crate::traits::Store;

    pub(crate) async fn run_all<S: Store, F: Fn() -> S>(make: F) {
        empty_store(&make()).await;
        append_and_read_back(&make()).await;
        rejects_block_not_extending_head(&make()).await;
        rejects_duplicate_tx_id(&make()).await;
        rejects_transaction_for_other_block(&make()).await;
        document_history_order(&make()).await;
        time_window_bounds(&make()).await;
        chain_range_includes_transactions(&make()).await;
    }

    async fn fill<S: Store>(store: &S, entries: &[(Block, Transaction)]) {
        for (block, tx) in entries {
            store.append_block(block, tx).await.unwrap();
        }
    }

    async fn empty_store<S: Store>(store: &S) {
        assert_eq!(store.head().await.unwrap(), None);
        assert_eq!(store.block_count().await.unwrap(), 0);
        assert_eq!(store.get_block(1).await.unwrap(), None);
        assert!(store.transactions_between(None, None).await.unwrap().is_empty());
    }

    async fn append_and_read_back<S: Store>(store: &S) {
        let entries = chain_of(4);
        fill(store, &entries).await;

        assert_eq!(store.block_count().await.unwrap(), 4);
        assert_eq!(store.head().await.unwrap().as_ref(), Some(&entries[3].0));
        for (block, tx) in &entries {
            assert_eq!(store.get_block(block.number).await.unwrap().as_ref(), Some(block));
            assert_eq!(store.get_transaction(tx.tx_id()).await.unwrap().as_ref(), Some(tx));
            assert_eq!(
                store.transactions_for_block(block.number).await.unwrap(),
                vec![tx.clone()]
            );
        }
        assert_eq!(store.get_block(5).await.unwrap(), None);
    }

    async fn rejects_block_not_extending_head<S: Store>(store: &S) {
        let entries = chain_of(2);
        fill(store, &entries[..1]).await;

        // Skips a number.
        let (gap_block, gap_tx) = entry(3, entries[0].0.data_hash, entries[1].1.body.clone());
        assert!(matches!(
            store.append_block(&gap_block, &gap_tx).await,
            Err(StoreError::HeadMismatch { expected_number: 2, number: 3, .. })
        ));

        // Right number, stale parent.
        let (stale_block, stale_tx) = entry(2, DataHash::ZERO, entries[1].1.body.clone());
        assert!(matches!(
            store.append_block(&stale_block, &stale_tx).await,
            Err(StoreError::HeadMismatch { expected_number: 2, number: 2, .. })
        ));

        assert_eq!(store.block_count().await.unwrap(), 1);
        assert_eq!(store.get_transaction(entries[1].1.tx_id()).await.unwrap(), None);
    }

    async fn rejects_duplicate_tx_id<S: Store>(store: &S) {
        let entries = chain_of(2);
        fill(store, &entries).await;

        let mut reused = event("DOC-C", "op-2", Action::Sign, at(100));
        reused.tx_id = entries[1].1.tx_id().clone();
        let (block, tx) = entry(3, entries[1].0.data_hash, reused);

        assert!(matches!(
            store.append_block(&block, &tx).await,
            Err(StoreError::DuplicateTransaction(_))
        ));
        assert_eq!(store.block_count().await.unwrap(), 2);
        assert_eq!(store.get_block(3).await.unwrap(), None);
    }

    async fn rejects_transaction_for_other_block<S: Store>(store: &S) {
        let (block, tx) = chain_of(1).remove(0);
        let misassigned = tx.body.clone().commit(9);
        assert!(matches!(
            store.append_block(&block, &misassigned).await,
            Err(StoreError::InvalidData(_))
        ));
        assert_eq!(store.block_count().await.unwrap(), 0);
    }

    async fn document_history_order<S: Store>(store: &S) {
        let genesis = entry(1, DataHash::ZERO, PendingTransaction::genesis(at(0)).unwrap());
        // Block 3 carries an earlier event time than block 2; block 4 ties with block 2.
        let b2 = entry(2, genesis.0.data_hash, event("DOC-1", "op-1", Action::Export, at(50)));
        let b3 = entry(3, b2.0.data_hash, event("DOC-1", "op-2", Action::Sign, at(20)));
        let b4 = entry(4, b3.0.data_hash, event("DOC-1", "op-1", Action::Verify, at(50)));
        let b5 = entry(5, b4.0.data_hash, event("DOC-2", "op-1", Action::Update, at(30)));
        fill(store, &[genesis, b2, b3, b4, b5]).await;

        let history = store.transactions_for_document("DOC-1").await.unwrap();
        let numbers: Vec<u64> = history.iter().map(|tx| tx.block_number).collect();
        assert_eq!(numbers, [3, 2, 4]);

        assert!(store.transactions_for_document("DOC-404").await.unwrap().is_empty());
    }

    async fn time_window_bounds<S: Store>(store: &S) {
        // Event times: 10 (genesis), 20, 30, 40, 50
        let entries = chain_of(5);
        fill(store, &entries).await;

        let inclusive = store
            .transactions_between(Some(at(20)), Some(at(40)))
            .await
            .unwrap();
        let numbers: Vec<u64> = inclusive.iter().map(|tx| tx.block_number).collect();
        assert_eq!(numbers, [2, 3, 4]);

        let open_start = store.transactions_between(None, Some(at(20))).await.unwrap();
        assert_eq!(open_start.len(), 2);

        let open_end = store.transactions_between(Some(at(41)), None).await.unwrap();
        assert_eq!(open_end.len(), 1);

        let everything = store.transactions_between(None, None).await.unwrap();
        assert_eq!(everything.len(), 5);

        let empty = store
            .transactions_between(Some(at(60)), Some(at(10)))
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    async fn chain_range_includes_transactions<S: Store>(store: &S) {
        let entries = chain_of(4);
        fill(store, &entries).await;

        let range = store.chain_range(2, 3).await.unwrap();
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].block, entries[1].0);
        assert_eq!(range[0].transactions, vec![entries[1].1.clone()]);
        assert_eq!(range[1].block.number, 3);

        assert_eq!(store.chain_range(1, 100).await.unwrap().len(), 4);
        assert!(store.chain_range(10, 20).await.unwrap().is_empty());
    }
}
