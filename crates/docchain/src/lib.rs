//! # DocChain
//!
//! A tamper-evident audit ledger for document lifecycle events.
//!
//! ## Overview
//!
//! Every export, signature, verification or update of a document is recorded
//! as a transaction inside its own proof-of-work block. Blocks are linked by
//! hash, so rewriting any stored row is detected when the chain is replayed.
//!
//! - **Blocks**: one transaction each, numbered from 1 (genesis)
//! - **Mining**: bounded nonce search for a digest with leading hex zeros
//! - **Queries**: per-document history and tallies over a time window
//! - **Validation**: full replay reporting the first failing block
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docchain::{Action, EventBuilder, Ledger, LedgerConfig};
//!
//! async fn example() {
//!     // Opening an empty database mines the genesis block
//!     let ledger = Ledger::open_path("audit-blockchain.db", LedgerConfig::default())
//!         .await
//!         .unwrap();
//!
//!     let tx_id = ledger
//!         .record_event(
//!             EventBuilder::new(Action::Export)
//!                 .operator("user_123")
//!                 .certificate("SHA1:AB:CD:EF")
//!                 .document("DOC-2025-001")
//!                 .summary("employment record export"),
//!         )
//!         .await
//!         .unwrap();
//!
//!     let history = ledger.history_of("DOC-2025-001").await.unwrap();
//!     assert_eq!(history[0].tx_id(), &tx_id);
//!
//!     assert!(ledger.validate().await.unwrap().is_valid());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `docchain::core` - Core primitives (Block, Transaction, hashing, mining)
//! - `docchain::store` - Storage abstraction and SQLite

mod builder;
pub mod config;
pub mod error;
pub mod ledger;
pub mod query;

// Re-export component crates
pub use docchain_core as core;
pub use docchain_store as store;

// Re-export main types for convenience
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use query::{AuditReport, ReportPeriod, SYSTEM_OPERATOR};

// Re-export commonly used core types
pub use docchain_core::{
    Action, Block, DataHash, EventBuilder, IntegrityError, PendingTransaction, Timestamp,
    Transaction, TxId, ValidationReport, Violation,
};
pub use docchain_store::ChainEntry;
