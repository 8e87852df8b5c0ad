//! Golden test vectors for deterministic verification.
//!
//! These vectors ensure that canonical encoding produces identical results
//! across all implementations. Expected digests were produced independently
//! with `json.dumps(value, sort_keys=True)` and SHA-256.

use docchain_core::{
    canonical_json, mine, parse_timestamp, Action, BlockPayload, CoreError, DataHash,
    EventBuilder, PendingTransaction,
};
use serde_json::Value;

/// A canonical-encoding vector: JSON input and its expected encoding.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Input document (any key order, any valid JSON escapes).
    pub input: &'static str,
    /// Expected canonical encoding.
    pub expected_canonical: &'static str,
    /// Expected SHA-256 of the canonical encoding (hex).
    pub expected_hash: &'static str,
}

/// Get all canonical-encoding vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "flat object, keys out of order",
            input: r#"{"b": 2, "a": 1}"#,
            expected_canonical: r#"{"a": 1, "b": 2}"#,
            expected_hash: "d8497d9d82770a70729261095aa98f7ef5154d7af499f8037b6ca250296785a6",
        },
        GoldenVector {
            name: "nested objects and arrays",
            input: r#"{"z": [1, -2, {"y": null, "x": true}], "a": {"c": "d", "b": false}}"#,
            expected_canonical: r#"{"a": {"b": false, "c": "d"}, "z": [1, -2, {"x": true, "y": null}]}"#,
            expected_hash: "ac79d9dc90701a98a80cfd496144b68a7bff511e19e437453465b5f9a25e501e",
        },
        GoldenVector {
            name: "short escapes",
            input: r#"{"text": "line\nbreak \"quoted\" back\\slash\ttab"}"#,
            expected_canonical: r#"{"text": "line\nbreak \"quoted\" back\\slash\ttab"}"#,
            expected_hash: "0d6ef81397802d123f85d50ffb7919c7a4b661944f89c72591d75ea246cf7ab5",
        },
        GoldenVector {
            name: "non-ASCII and astral code points",
            input: r#"{"summary": "\u042d\u043a\u0441\u043f\u043e\u0440\u0442 caf\u00e9 \ud83d\udcc4"}"#,
            expected_canonical: r#"{"summary": "\u042d\u043a\u0441\u043f\u043e\u0440\u0442 caf\u00e9 \ud83d\udcc4"}"#,
            expected_hash: "c773c0cecbaf6fd496684e41434fd055eaed9903b8b40cd0eb955e7a4d93eeff",
        },
        GoldenVector {
            name: "empty containers",
            input: r#"{"map": {}, "list": []}"#,
            expected_canonical: r#"{"list": [], "map": {}}"#,
            expected_hash: "7874de723f699f51476011924bc21e6a1dcb24904f49ee873e136b88b3fea90e",
        },
    ]
}

/// Outcome of checking one vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorResult {
    pub name: String,
    pub canonical: String,
    pub hash: String,
    pub matches: bool,
}

/// Encode one vector's input.
pub fn check_vector(vector: &GoldenVector) -> Result<VectorResult, CoreError> {
    let value: Value =
        serde_json::from_str(vector.input).map_err(|e| CoreError::Encoding(e.to_string()))?;
    let bytes = canonical_json(&value)?;
    let hash = DataHash::hash(&bytes).to_hex();
    let canonical = String::from_utf8_lossy(&bytes).into_owned();
    let matches = canonical == vector.expected_canonical && hash == vector.expected_hash;
    Ok(VectorResult {
        name: vector.name.to_string(),
        canonical,
        hash,
        matches,
    })
}

/// Verify all canonical vectors.
pub fn verify_all_vectors() -> Result<Vec<VectorResult>, CoreError> {
    all_vectors().iter().map(check_vector).collect()
}

/// A mined-block vector: a fixed payload, difficulty and the expected winner.
#[derive(Debug, Clone)]
pub struct BlockVector {
    pub name: &'static str,
    pub payload: BlockPayload,
    pub difficulty: u32,
    pub expected_nonce: u64,
    pub expected_hash: &'static str,
}

/// Genesis at a fixed time, then a signing event chained onto it.
pub fn block_vectors() -> Vec<BlockVector> {
    let created = parse_timestamp("2025-01-01T00:00:00Z").expect("fixed timestamp");
    let genesis = PendingTransaction::genesis(created).expect("genesis summary");
    let genesis_hash = "000bc15853eaf7235b3125266e03605eb32b5d6d5d79ec065714145bb0f379e6";

    let sign = EventBuilder::new(Action::Sign)
        .tx_id("TX-20250115102030-abcdef01-00000001")
        .operator("user_123")
        .certificate("SHA1:AB:CD:EF:12:34")
        .document("DOC-2025-001")
        .summary(
            "\u{41f}\u{43e}\u{434}\u{43f}\u{438}\u{441}\u{430}\u{43d}\u{438}\u{435} \
             \u{434}\u{43e}\u{433}\u{43e}\u{432}\u{43e}\u{440}\u{430}",
        )
        .signature(Some("MEUCIQ==".into()))
        .timestamp(parse_timestamp("2025-01-15T10:20:30.123456Z").expect("fixed timestamp"))
        .build()
        .expect("complete event");

    vec![
        BlockVector {
            name: "genesis at difficulty 3",
            payload: BlockPayload::new(DataHash::ZERO, created, genesis),
            difficulty: 3,
            expected_nonce: 5831,
            expected_hash: genesis_hash,
        },
        BlockVector {
            name: "signing event with non-ASCII summary",
            payload: BlockPayload::new(
                DataHash::from_hex(genesis_hash).expect("hex"),
                parse_timestamp("2025-01-15T10:20:31Z").expect("fixed timestamp"),
                sign,
            ),
            difficulty: 3,
            expected_nonce: 1090,
            expected_hash: "0002abd8486275e72079e78513f604b97f03dae7a3fee91bf9ba8d3e659eacdf",
        },
    ]
}

/// Mine a block vector from scratch.
pub fn mine_vector(vector: &BlockVector) -> Result<(u64, String), CoreError> {
    let mined = mine(&vector.payload, vector.difficulty, u64::MAX)?;
    Ok((mined.nonce, mined.data_hash.to_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_vectors_match() {
        for result in verify_all_vectors().unwrap() {
            assert!(
                result.matches,
                "{}: got {} / {}",
                result.name, result.canonical, result.hash
            );
        }
    }

    #[test]
    fn test_block_vectors_mine_to_expected_nonce() {
        for vector in block_vectors() {
            let (nonce, hash) = mine_vector(&vector).unwrap();
            assert_eq!(nonce, vector.expected_nonce, "{}", vector.name);
            assert_eq!(hash, vector.expected_hash, "{}", vector.name);
        }
    }

    #[test]
    fn test_genesis_summary_is_canonical_json() {
        let vector = &block_vectors()[0];
        assert_eq!(
            vector.payload.transactions[0].data_summary,
            r#"{"created": "2025-01-01T00:00:00.000000Z", "message": "DOCScoin Audit Blockchain Genesis Block", "standard_version": "2.0.0"}"#
        );
    }
}
