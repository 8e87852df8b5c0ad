//! Out-of-band edits to the SQLite file are caught by replay.

mod common;

use common::{disk_ledger, event, tamper, DiskLedger};
use docchain::{Action, IntegrityError, LedgerError};

async fn ledger_with_events(n: usize) -> DiskLedger {
    let disk = disk_ledger().await;
    for i in 0..n {
        disk.ledger
            .record_event(event(&format!("DOC-{i}"), "op-1", Action::Export))
            .await
            .unwrap();
    }
    assert!(disk.ledger.validate().await.unwrap().is_valid());
    disk
}

#[tokio::test]
async fn test_changed_nonce_is_hash_mismatch() {
    let disk = ledger_with_events(4).await;
    tamper(&disk.path, "UPDATE blocks SET nonce = nonce + 1 WHERE block_number = 3");

    let report = disk.ledger.validate().await.unwrap();
    let violation = report.first_violation.unwrap();
    assert_eq!(violation.block_number, 3);
    assert!(matches!(violation.reason, IntegrityError::HashMismatch { .. }));
    assert_eq!(report.blocks_checked, 3);
}

#[tokio::test]
async fn test_replaced_data_hash_is_hash_mismatch() {
    let disk = ledger_with_events(3).await;
    let forged = "0".repeat(64);
    tamper(
        &disk.path,
        &format!(
            "UPDATE blocks SET data_hash = '{forged}', merkle_root = '{forged}' \
             WHERE block_number = 2"
        ),
    );

    let violation = disk.ledger.validate().await.unwrap().first_violation.unwrap();
    assert_eq!(violation.block_number, 2);
    assert!(matches!(violation.reason, IntegrityError::HashMismatch { .. }));
}

#[tokio::test]
async fn test_rewritten_summary_is_hash_mismatch() {
    let disk = ledger_with_events(3).await;
    tamper(
        &disk.path,
        "UPDATE transactions SET data_summary = 'nothing to see' WHERE block_number = 4",
    );

    let violation = disk.ledger.validate().await.unwrap().first_violation.unwrap();
    assert_eq!(violation.block_number, 4);
    assert!(matches!(violation.reason, IntegrityError::HashMismatch { .. }));
}

#[tokio::test]
async fn test_rewritten_operator_is_hash_mismatch() {
    let disk = ledger_with_events(2).await;
    tamper(
        &disk.path,
        "UPDATE transactions SET operator_id = 'someone-else' WHERE block_number = 2",
    );

    let violation = disk.ledger.validate().await.unwrap().first_violation.unwrap();
    assert_eq!(violation.block_number, 2);
}

#[tokio::test]
async fn test_deleted_block_is_number_gap() {
    let disk = ledger_with_events(4).await;
    tamper(
        &disk.path,
        "DELETE FROM transactions WHERE block_number = 3;
         DELETE FROM blocks WHERE block_number = 3;",
    );

    let violation = disk.ledger.validate().await.unwrap().first_violation.unwrap();
    assert_eq!(
        violation.reason,
        IntegrityError::NumberGap {
            expected: 3,
            found: 4
        }
    );
}

#[tokio::test]
async fn test_orphaned_block_is_missing_transaction() {
    let disk = ledger_with_events(2).await;
    tamper(&disk.path, "DELETE FROM transactions WHERE block_number = 2");

    let violation = disk.ledger.validate().await.unwrap().first_violation.unwrap();
    assert_eq!(violation.block_number, 2);
    assert_eq!(violation.reason, IntegrityError::MissingTransaction);
}

#[tokio::test]
async fn test_raised_difficulty_claim_is_difficulty_not_met() {
    let disk = ledger_with_events(2).await;
    tamper(&disk.path, "UPDATE blocks SET difficulty = 64 WHERE block_number = 2");

    let violation = disk.ledger.validate().await.unwrap().first_violation.unwrap();
    assert_eq!(violation.block_number, 2);
    assert!(matches!(
        violation.reason,
        IntegrityError::DifficultyNotMet { difficulty: 64, .. }
    ));
}

#[tokio::test]
async fn test_ensure_valid_turns_violation_into_error() {
    let disk = ledger_with_events(2).await;
    tamper(&disk.path, "UPDATE blocks SET nonce = nonce + 7 WHERE block_number = 1");

    match disk.ledger.ensure_valid().await {
        Err(LedgerError::Integrity(violation)) => assert_eq!(violation.block_number, 1),
        other => panic!("expected integrity error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_validate_does_not_modify_the_store() {
    let disk = ledger_with_events(3).await;
    tamper(&disk.path, "UPDATE blocks SET nonce = nonce + 1 WHERE block_number = 2");

    let before = disk.ledger.block(2).await.unwrap();
    disk.ledger.validate().await.unwrap();
    disk.ledger.validate().await.unwrap();
    assert_eq!(disk.ledger.block(2).await.unwrap(), before);
    assert_eq!(disk.ledger.chain_length().await.unwrap(), 4);
}

async fn undecodable_violation(events: usize, sql: &str) -> (u64, u64, String) {
    let disk = ledger_with_events(events).await;
    tamper(&disk.path, sql);

    let report = disk.ledger.validate().await.unwrap();
    let violation = report.first_violation.unwrap();
    match violation.reason {
        IntegrityError::Undecodable(reason) => {
            (violation.block_number, report.blocks_checked, reason)
        }
        other => panic!("expected undecodable block, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_data_hash_is_reported_at_its_block() {
    let (block, checked, reason) = undecodable_violation(
        3,
        "UPDATE blocks SET data_hash = 'deadbeef' WHERE block_number = 2",
    )
    .await;
    assert_eq!(block, 2);
    assert_eq!(checked, 2);
    assert!(reason.contains("data_hash"), "{reason}");
}

#[tokio::test]
async fn test_negative_nonce_is_reported_at_its_block() {
    let (block, _, reason) =
        undecodable_violation(3, "UPDATE blocks SET nonce = -1 WHERE block_number = 3").await;
    assert_eq!(block, 3);
    assert!(reason.contains("nonce"), "{reason}");
}

#[tokio::test]
async fn test_text_nonce_is_reported_at_its_block() {
    let (block, _, reason) =
        undecodable_violation(2, "UPDATE blocks SET nonce = 'forty-two' WHERE block_number = 2")
            .await;
    assert_eq!(block, 2);
    assert!(reason.contains("nonce"), "{reason}");
}

#[tokio::test]
async fn test_garbled_transaction_timestamp_is_reported_at_its_block() {
    let (block, _, reason) = undecodable_violation(
        3,
        "UPDATE transactions SET timestamp = 'last tuesday' WHERE block_number = 3",
    )
    .await;
    assert_eq!(block, 3);
    assert!(reason.contains("timestamp"), "{reason}");
}

#[tokio::test]
async fn test_earlier_hash_mismatch_wins_over_later_undecodable_block() {
    let disk = ledger_with_events(4).await;
    tamper(
        &disk.path,
        "UPDATE blocks SET nonce = nonce + 1 WHERE block_number = 2;
         UPDATE blocks SET previous_hash = 'zz' WHERE block_number = 4;",
    );

    let violation = disk.ledger.validate().await.unwrap().first_violation.unwrap();
    assert_eq!(violation.block_number, 2);
    assert!(matches!(violation.reason, IntegrityError::HashMismatch { .. }));
}
