#![allow(dead_code)]

use std::path::{Path, PathBuf};

use docchain::{Action, EventBuilder, Ledger, LedgerConfig, Timestamp};
use docchain::core::parse_timestamp;
use docchain::store::SqliteStore;
use tempfile::TempDir;

/// Low difficulty keeps mining fast while still exercising the search.
pub fn test_config() -> LedgerConfig {
    LedgerConfig::default().with_difficulty(1)
}

pub fn ts(s: &str) -> Timestamp {
    parse_timestamp(s).unwrap()
}

pub fn event(document: &str, operator: &str, action: Action) -> EventBuilder {
    EventBuilder::new(action)
        .operator(operator)
        .certificate("SHA1:AB:CD:EF:12:34")
        .document(document)
        .summary(format!("{action} of {document}"))
}

/// A SQLite ledger in a temporary directory.
pub struct DiskLedger {
    pub ledger: Ledger<SqliteStore>,
    pub path: PathBuf,
    _dir: TempDir,
}

/// Route ledger logs through the test harness; `RUST_LOG=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn disk_ledger() -> DiskLedger {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit-blockchain.db");
    let ledger = Ledger::open_path(&path, test_config()).await.unwrap();
    DiskLedger {
        ledger,
        path,
        _dir: dir,
    }
}

/// Out-of-band SQL against the ledger file, as an attacker with file access would.
pub fn tamper(path: &Path, sql: &str) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(sql).unwrap();
}
