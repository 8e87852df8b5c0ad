//! SHA-256 digests with a strong type.
//!
//! Digests are persisted and exchanged as 64 lowercase hex characters, which
//! is also the form the difficulty prefix is counted on.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataHash(pub [u8; 32]);

impl DataHash {
    /// Compute the SHA-256 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Hash the concatenation of `parts` without allocating it.
    pub fn hash_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHash(format!("{s:?}: {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidHash(format!("{s:?}: expected 32 bytes")))?;
        Ok(Self(arr))
    }

    /// Number of leading `0` characters in the hex rendering.
    pub fn leading_zero_nibbles(&self) -> u32 {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
                continue;
            }
            if byte >> 4 == 0 {
                count += 1;
            }
            break;
        }
        count
    }

    /// The all-zero hash: previous hash of the genesis block.
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for DataHash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for DataHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for DataHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for DataHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DataHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_leading_zero_nibbles_matches_hex(bytes: [u8; 32]) {
            let hash = DataHash::from_bytes(bytes);
            let expected = hash.to_hex().chars().take_while(|c| *c == '0').count() as u32;
            prop_assert_eq!(hash.leading_zero_nibbles(), expected);
        }

        #[test]
        fn test_hex_round_trip(bytes: [u8; 32]) {
            let hash = DataHash::from_bytes(bytes);
            prop_assert_eq!(DataHash::from_hex(&hash.to_hex()).unwrap(), hash);
        }
    }

    #[test]
    fn test_sha256_known_vector() {
        let h = DataHash::hash(b"abc");
        assert_eq!(
            h.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_parts_equals_hash_of_concatenation() {
        assert_eq!(DataHash::hash_parts(&[b"a", b"", b"bc"]), DataHash::hash(b"abc"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = DataHash::hash(b"test data");
        let recovered: DataHash = h.to_hex().parse().unwrap();
        assert_eq!(h, recovered);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(DataHash::from_hex("00ff").is_err());
        assert!(DataHash::from_hex("zz").is_err());
    }

    #[test]
    fn test_zero_hash_renders_as_64_zeros() {
        assert_eq!(DataHash::ZERO.to_hex(), "0".repeat(64));
        assert_eq!(DataHash::ZERO.leading_zero_nibbles(), 64);
    }

    #[test]
    fn test_leading_zero_nibbles() {
        let mut bytes = [0xffu8; 32];
        assert_eq!(DataHash(bytes).leading_zero_nibbles(), 0);

        bytes[0] = 0x0f;
        assert_eq!(DataHash(bytes).leading_zero_nibbles(), 1);

        bytes[0] = 0x00;
        bytes[1] = 0x00;
        bytes[2] = 0x0a;
        assert_eq!(DataHash(bytes).leading_zero_nibbles(), 5);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let h = DataHash::hash(b"x");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: DataHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
