//! Strong type definitions for DocChain.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::DataHash;
use crate::error::{CoreError, Result};

/// Ledger timestamps are UTC instants with microsecond precision.
pub type Timestamp = DateTime<Utc>;

/// Fixed-width rendering: lexical order equals chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Current time truncated to microseconds, so it survives a format/parse cycle.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp in the canonical ledger form.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (any offset, converted to UTC), a naive
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` (taken as UTC), or a bare `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<Timestamp> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(6));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive).trunc_subsecs(6));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(CoreError::InvalidTimestamp(s.to_string()))
}

/// A transaction identifier.
///
/// Regular ids look like `TX-20250115102030-1a2b3c4d-9f8e7d6c`: the commit
/// second, a prefix of the document id hash and a random suffix.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier for an event on `document_id`.
    pub fn generate(document_id: &str, at: &Timestamp) -> Self {
        let doc_hash = DataHash::hash(document_id.as_bytes()).to_hex();
        let suffix: u32 = rand::thread_rng().gen();
        Self(format!(
            "TX-{}-{}-{:08x}",
            at.format("%Y%m%d%H%M%S"),
            &doc_hash[..8],
            suffix
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TxId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for TxId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
