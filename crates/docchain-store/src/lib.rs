//! # DocChain Store
//!
//! Storage abstraction for the DocChain audit ledger. Provides a trait-based
//! interface for block and transaction persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts ledger storage behind the [`Store`] trait,
//! allowing the ledger to be storage-agnostic. The primary implementation
//! is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ChainEntry`] - A block with the transactions it owns
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docchain_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("audit-blockchain.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let head = store.head().await.unwrap();
//!     println!("chain length: {}", head.map_or(0, |b| b.number));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic append**: a block and its transaction land in one SQLite transaction
//! - **Head guard**: appends that do not extend the head fail with `HeadMismatch`
//! - **Text columns**: hashes are hex and timestamps fixed-width UTC, so rows
//!   stay readable with the `sqlite3` shell

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
mod testing;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ChainEntry, Store, StoredBlock};
