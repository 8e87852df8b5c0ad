//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, docchain_core::format_timestamp(&docchain_core::now())],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: blocks and transactions.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per block; block_number is contiguous from 1
        CREATE TABLE blocks (
            block_number INTEGER PRIMARY KEY,
            previous_hash TEXT NOT NULL,      -- 64 hex chars
            timestamp TEXT NOT NULL,          -- fixed-width UTC, microseconds
            data_hash TEXT NOT NULL,          -- 64 hex chars
            merkle_root TEXT NOT NULL,
            nonce INTEGER NOT NULL,
            difficulty INTEGER NOT NULL,
            miner TEXT NOT NULL
        );

        -- Each transaction is owned by exactly one block
        CREATE TABLE transactions (
            tx_id TEXT PRIMARY KEY,
            block_number INTEGER NOT NULL REFERENCES blocks(block_number),
            operation_type TEXT NOT NULL,
            operator_id TEXT,
            certificate_thumbprint TEXT,
            document_id TEXT,
            action TEXT NOT NULL,
            data_summary TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            signature TEXT
        );

        CREATE INDEX idx_transactions_block ON transactions(block_number);
        CREATE INDEX idx_transactions_document ON transactions(document_id);
        CREATE INDEX idx_transactions_timestamp ON transactions(timestamp);
        "#,
    )?;

    Ok(())
}
