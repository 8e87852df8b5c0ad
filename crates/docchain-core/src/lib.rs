//! # DocChain Core
//!
//! Pure primitives for the DocChain audit ledger: blocks, transactions,
//! canonical hashing, proof-of-work and chain validation.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over hash-linked data structures.
//!
//! ## Key Types
//!
//! - [`Block`] - A committed, hash-linked record wrapping one transaction
//! - [`Transaction`] - A document-lifecycle event owned by a block
//! - [`PendingTransaction`] - An event that has not been committed yet
//! - [`DataHash`] - SHA-256 digest rendered as 64 lowercase hex characters
//! - [`Action`] - What happened to the document (`export`, `sign`, ...)
//!
//! ## Canonicalization
//!
//! Block payloads are hashed over sorted-key canonical JSON. See [`canonical`].

pub mod block;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod mining;
pub mod transaction;
pub mod types;
pub mod validation;

pub use block::{Block, BlockPayload, DEFAULT_DIFFICULTY, MINER};
pub use canonical::{canonical_hash, canonical_json, to_canonical_json};
pub use crypto::DataHash;
pub use error::{CoreError, IntegrityError, Result};
pub use mining::{attempt_ceiling, meets_difficulty, mine, MinedBlock};
pub use transaction::{Action, EventBuilder, PendingTransaction, Transaction, GENESIS_TX_ID};
pub use types::{format_timestamp, now, parse_timestamp, Timestamp, TxId};
pub use validation::{validate_block, validate_chain, ChainValidator, ValidationReport, Violation};
