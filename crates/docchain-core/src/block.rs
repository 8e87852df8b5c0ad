//! Blocks: hash-linked records, each wrapping exactly one transaction.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::canonical::canonical_json;
use crate::crypto::DataHash;
use crate::error::{CoreError, Result};
use crate::mining::MinedBlock;
use crate::transaction::PendingTransaction;
use crate::types::{format_timestamp, Timestamp};

/// Leading hex-zero characters required by default.
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Identifier recorded as `miner` on every block.
pub const MINER: &str = "DOCScoin-Audit-System";

/// A committed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, starting at 1 for genesis.
    pub number: u64,
    pub previous_hash: DataHash,
    pub timestamp: Timestamp,
    /// Digest of the canonical payload, including the nonce.
    pub data_hash: DataHash,
    /// Equal to `data_hash` while blocks carry a single transaction.
    pub merkle_root: DataHash,
    pub nonce: u64,
    pub difficulty: u32,
    pub miner: String,
}

impl Block {
    /// Assemble a block from a mined payload.
    pub fn from_mined(
        number: u64,
        payload: &BlockPayload,
        mined: &MinedBlock,
        difficulty: u32,
        miner: impl Into<String>,
    ) -> Self {
        Self {
            number,
            previous_hash: payload.previous_hash,
            timestamp: payload.timestamp,
            data_hash: mined.data_hash,
            merkle_root: mined.data_hash,
            nonce: mined.nonce,
            difficulty,
            miner: miner.into(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.number == 1
    }

    /// Rebuild the hashed payload from this block's recorded fields.
    pub fn payload(&self, transactions: Vec<PendingTransaction>) -> BlockPayload {
        BlockPayload {
            previous_hash: self.previous_hash,
            timestamp: self.timestamp,
            transactions,
        }
    }
}

/// Everything hashed into a block except the nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPayload {
    pub previous_hash: DataHash,
    pub timestamp: Timestamp,
    pub transactions: Vec<PendingTransaction>,
}

impl BlockPayload {
    pub fn new(previous_hash: DataHash, timestamp: Timestamp, tx: PendingTransaction) -> Self {
        Self {
            previous_hash,
            timestamp,
            transactions: vec![tx],
        }
    }

    /// The JSON object hashed for `nonce`.
    pub fn to_value(&self, nonce: u64) -> Value {
        let transactions: Vec<Value> = self
            .transactions
            .iter()
            .map(PendingTransaction::to_canonical_value)
            .collect();
        json!({
            "transactions": transactions,
            "timestamp": format_timestamp(&self.timestamp),
            "previous_hash": self.previous_hash.to_hex(),
            "nonce": nonce,
        })
    }

    /// Digest of the canonical payload for `nonce`.
    pub fn digest(&self, nonce: u64) -> Result<DataHash> {
        Ok(DataHash::hash(&canonical_json(&self.to_value(nonce))?))
    }

    /// Precompute the nonce-independent bytes for repeated hashing.
    pub fn hasher(&self) -> Result<PayloadHasher> {
        let mut without_nonce = self.to_value(0);
        if let Value::Object(map) = &mut without_nonce {
            map.remove("nonce");
        }
        let encoded = canonical_json(&without_nonce)?;
        // "nonce" sorts before every other key, so the full encoding is
        // `{"nonce": N, ` followed by the rest of this object minus its `{`.
        let rest = encoded
            .strip_prefix(b"{")
            .ok_or_else(|| CoreError::Encoding("payload is not an object".into()))?;
        let mut suffix = Vec::with_capacity(rest.len() + 2);
        suffix.extend_from_slice(b", ");
        suffix.extend_from_slice(rest);
        Ok(PayloadHasher { suffix })
    }
}

/// Hashes a fixed payload for varying nonces.
#[derive(Debug, Clone)]
pub struct PayloadHasher {
    suffix: Vec<u8>,
}

impl PayloadHasher {
    const PREFIX: &'static [u8] = b"{\"nonce\": ";

    pub fn digest(&self, nonce: u64) -> DataHash {
        let digits = nonce.to_string();
        DataHash::hash_parts(&[Self::PREFIX, digits.as_bytes(), &self.suffix])
    }
}
