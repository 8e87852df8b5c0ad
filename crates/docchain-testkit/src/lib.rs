//! # DocChain Testkit
//!
//! Testing utilities for DocChain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known canonical encodings and mined blocks for cross-implementation verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A memory-backed ledger with recording helpers
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the canonical encoding and the proof-of-work search:
//!
//! ```rust
//! use docchain_testkit::vectors::{block_vectors, mine_vector, verify_all_vectors};
//!
//! for result in verify_all_vectors().unwrap() {
//!     assert!(result.matches, "{}", result.name);
//! }
//! let genesis = &block_vectors()[0];
//! let (nonce, _) = mine_vector(genesis).unwrap();
//! assert_eq!(nonce, genesis.expected_nonce);
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docchain_testkit::generators::{pending_from_params, EventParams};
//!
//! proptest! {
//!     #[test]
//!     fn payload_digest_is_deterministic(params: EventParams) {
//!         let tx = pending_from_params(&params);
//!         let payload = BlockPayload::new(DataHash::ZERO, tx.timestamp, tx);
//!         prop_assert_eq!(payload.digest(7).unwrap(), payload.digest(7).unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use docchain_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new().await?;
//! fixture.record("DOC-1", "alice", Action::Sign).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{test_config, TestFixture};
pub use generators::{chain_from_events, pending_from_params, EventParams};
pub use vectors::{all_vectors, block_vectors, verify_all_vectors, BlockVector, GoldenVector};
