//! Canonical JSON encoding for deterministic hashing.
//!
//! The encoding is byte-for-byte what `json.dumps(value, sort_keys=True)`
//! produces with default settings, so any implementation that follows these
//! rules reproduces the same digests:
//! - Object keys sorted by code point
//! - `", "` between members, `": "` between key and value
//! - Non-ASCII and control characters escaped as `\uXXXX` (lowercase hex,
//!   surrogate pairs above U+FFFF)
//! - Integers in plain decimal, no floats
//!
//! This encoding is FROZEN. Changing it invalidates every stored `data_hash`.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt::Write;

use crate::crypto::DataHash;
use crate::error::{CoreError, Result};

const ITEM_SEPARATOR: &[u8] = b", ";
const KEY_SEPARATOR: &[u8] = b": ";

/// Encode a JSON value to canonical bytes.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Serialize any value through `serde_json` and encode it canonically.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value).map_err(|e| CoreError::Encoding(e.to_string()))?;
    canonical_json(&value)
}

/// SHA-256 of the canonical encoding.
pub fn canonical_hash(value: &Value) -> Result<DataHash> {
    Ok(DataHash::hash(&canonical_json(value)?))
}

/// Recursively encode a value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => encode_number(buf, n)?,
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => encode_array(buf, items)?,
        Value::Object(map) => encode_object(buf, map)?,
    }
    Ok(())
}

fn encode_number(buf: &mut Vec<u8>, n: &Number) -> Result<()> {
    if let Some(u) = n.as_u64() {
        buf.extend_from_slice(u.to_string().as_bytes());
    } else if let Some(i) = n.as_i64() {
        buf.extend_from_slice(i.to_string().as_bytes());
    } else {
        return Err(CoreError::UnsupportedFloat);
    }
    Ok(())
}

/// Encode a string with ASCII-only output.
fn encode_string(buf: &mut Vec<u8>, s: &str) {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    // Writing to a String cannot fail.
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
    buf.extend_from_slice(out.as_bytes());
}

fn encode_array(buf: &mut Vec<u8>, items: &[Value]) -> Result<()> {
    buf.push(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.extend_from_slice(ITEM_SEPARATOR);
        }
        encode_value_to(buf, item)?;
    }
    buf.push(b']');
    Ok(())
}

/// Encode an object with keys in code-point order.
fn encode_object(buf: &mut Vec<u8>, map: &Map<String, Value>) -> Result<()> {
    // UTF-8 byte order equals code-point order.
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    buf.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.extend_from_slice(ITEM_SEPARATOR);
        }
        encode_string(buf, key);
        buf.extend_from_slice(KEY_SEPARATOR);
        encode_value_to(buf, value)?;
    }
    buf.push(b'}');
    Ok(())
}
