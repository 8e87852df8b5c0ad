//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the audit ledger. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};

use docchain_core::{
    format_timestamp, parse_timestamp, Action, Block, DataHash, PendingTransaction, Timestamp,
    Transaction, TxId,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_append, ChainEntry, Store, StoredBlock};

/// How long a writer waits for another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const BLOCK_COLUMNS: &str =
    "block_number, previous_hash, timestamp, data_hash, merkle_root, nonce, difficulty, miner";

const TRANSACTION_COLUMNS: &str = "tx_id, block_number, operation_type, operator_id, \
     certificate_thumbprint, document_id, action, data_summary, timestamp, signature";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Poisoned(format!("sqlite connection: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Row conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Raw column values; parsed into domain types outside the rusqlite closure.
///
/// Every column except the key is read as a loosely typed [`Value`], so a row
/// rewritten out-of-band into the wrong type surfaces as `InvalidData` rather
/// than a database error.
struct BlockRow {
    number: u64,
    previous_hash: Value,
    timestamp: Value,
    data_hash: Value,
    merkle_root: Value,
    nonce: Value,
    difficulty: Value,
    miner: Value,
}

fn read_block_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlockRow> {
    Ok(BlockRow {
        number: row.get("block_number")?,
        previous_hash: row.get("previous_hash")?,
        timestamp: row.get("timestamp")?,
        data_hash: row.get("data_hash")?,
        merkle_root: row.get("merkle_root")?,
        nonce: row.get("nonce")?,
        difficulty: row.get("difficulty")?,
        miner: row.get("miner")?,
    })
}

fn text(column: &str, value: Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(StoreError::InvalidData(format!(
            "{column}: expected text, found {}",
            other.data_type()
        ))),
    }
}

fn optional_text(column: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        other => text(column, other).map(Some),
    }
}

fn integer<T: TryFrom<i64>>(column: &str, value: Value) -> Result<T> {
    match value {
        Value::Integer(i) => T::try_from(i)
            .map_err(|_| StoreError::InvalidData(format!("{column}: {i} is out of range"))),
        other => Err(StoreError::InvalidData(format!(
            "{column}: expected integer, found {}",
            other.data_type()
        ))),
    }
}

fn hash(column: &str, value: Value) -> Result<DataHash> {
    let hex = text(column, value)?;
    DataHash::from_hex(&hex).map_err(|e| StoreError::InvalidData(format!("{column}: {e}")))
}

fn timestamp(column: &str, value: Value) -> Result<Timestamp> {
    let raw = text(column, value)?;
    parse_timestamp(&raw).map_err(|e| StoreError::InvalidData(format!("{column}: {e}")))
}

impl TryFrom<BlockRow> for Block {
    type Error = StoreError;

    fn try_from(row: BlockRow) -> Result<Self> {
        Ok(Block {
            number: row.number,
            previous_hash: hash("previous_hash", row.previous_hash)?,
            timestamp: timestamp("timestamp", row.timestamp)?,
            data_hash: hash("data_hash", row.data_hash)?,
            merkle_root: hash("merkle_root", row.merkle_root)?,
            nonce: integer("nonce", row.nonce)?,
            difficulty: integer("difficulty", row.difficulty)?,
            miner: text("miner", row.miner)?,
        })
    }
}

struct TransactionRow {
    block_number: u64,
    tx_id: Value,
    operation_type: Value,
    operator_id: Value,
    certificate_thumbprint: Value,
    document_id: Value,
    action: Value,
    data_summary: Value,
    timestamp: Value,
    signature: Value,
}

fn read_transaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok(TransactionRow {
        block_number: row.get("block_number")?,
        tx_id: row.get("tx_id")?,
        operation_type: row.get("operation_type")?,
        operator_id: row.get("operator_id")?,
        certificate_thumbprint: row.get("certificate_thumbprint")?,
        document_id: row.get("document_id")?,
        action: row.get("action")?,
        data_summary: row.get("data_summary")?,
        timestamp: row.get("timestamp")?,
        signature: row.get("signature")?,
    })
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let action = text("action", row.action)?;
        let body = PendingTransaction {
            tx_id: TxId::new(text("tx_id", row.tx_id)?),
            operation_type: text("operation_type", row.operation_type)?,
            operator_id: optional_text("operator_id", row.operator_id)?,
            certificate_thumbprint: optional_text(
                "certificate_thumbprint",
                row.certificate_thumbprint,
            )?,
            document_id: optional_text("document_id", row.document_id)?,
            action: action
                .parse::<Action>()
                .map_err(|e| StoreError::InvalidData(format!("action: {e}")))?,
            data_summary: text("data_summary", row.data_summary)?,
            timestamp: timestamp("timestamp", row.timestamp)?,
            signature: optional_text("signature", row.signature)?,
        };
        Ok(body.commit(row.block_number))
    }
}

fn query_rows<T, P, F>(conn: &Connection, sql: &str, params: P, read: F) -> Result<Vec<T>>
where
    P: rusqlite::Params,
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, read)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_transactions<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Transaction>> {
    query_rows(conn, sql, params, read_transaction_row)?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
}

/// Blocks in `start..=end` with their transactions, decoding each block
/// independently.
fn read_range(conn: &Connection, start: u64, end: u64) -> Result<Vec<StoredBlock>> {
    let blocks = query_rows(
        conn,
        &format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks
             WHERE block_number BETWEEN ?1 AND ?2 ORDER BY block_number"
        ),
        params![start, end],
        read_block_row,
    )?;
    let transactions = query_rows(
        conn,
        &format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE block_number BETWEEN ?1 AND ?2
             ORDER BY block_number, timestamp, tx_id"
        ),
        params![start, end],
        read_transaction_row,
    )?;

    let mut owned: BTreeMap<u64, Vec<TransactionRow>> = BTreeMap::new();
    for row in transactions {
        owned.entry(row.block_number).or_default().push(row);
    }

    Ok(blocks
        .into_iter()
        .map(|row| {
            let number = row.number;
            let rows = owned.remove(&number).unwrap_or_default();
            let decoded = Block::try_from(row).and_then(|block| {
                let transactions = rows
                    .into_iter()
                    .map(Transaction::try_from)
                    .collect::<Result<Vec<_>>>()?;
                Ok(ChainEntry {
                    block,
                    transactions,
                })
            });
            match decoded {
                Ok(entry) => StoredBlock::Intact(entry),
                Err(e) => StoredBlock::Undecodable {
                    number,
                    reason: e.to_string(),
                },
            }
        })
        .collect())
}

fn insert_block(conn: &Connection, block: &Block) -> Result<()> {
    conn.execute(
        "INSERT INTO blocks (
            block_number, previous_hash, timestamp, data_hash, merkle_root,
            nonce, difficulty, miner
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            block.number,
            block.previous_hash.to_hex(),
            format_timestamp(&block.timestamp),
            block.data_hash.to_hex(),
            block.merkle_root.to_hex(),
            block.nonce,
            block.difficulty,
            block.miner,
        ],
    )?;
    Ok(())
}

fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<()> {
    let body = &tx.body;
    conn.execute(
        "INSERT INTO transactions (
            tx_id, block_number, operation_type, operator_id, certificate_thumbprint,
            document_id, action, data_summary, timestamp, signature
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            body.tx_id.as_str(),
            tx.block_number,
            body.operation_type,
            body.operator_id,
            body.certificate_thumbprint,
            body.document_id,
            body.action.as_str(),
            body.data_summary,
            format_timestamp(&body.timestamp),
            body.signature,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn head(&self) -> Result<Option<Block>> {
        self.run(|conn| {
            let sql =
                format!("SELECT {BLOCK_COLUMNS} FROM blocks ORDER BY block_number DESC LIMIT 1");
            let row = conn.query_row(&sql, [], read_block_row).optional()?;
            row.map(Block::try_from).transpose()
        })
        .await
    }

    async fn block_count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: u64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
    }

    async fn append_block(&self, block: &Block, transaction: &Transaction) -> Result<()> {
        let block = block.clone();
        let transaction = transaction.clone();

        self.run(move |conn| {
            // IMMEDIATE takes the write lock up front, so the head read below
            // cannot go stale before commit.
            let db_tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let head: Option<(u64, String)> = db_tx
                .query_row(
                    "SELECT block_number, data_hash FROM blocks ORDER BY block_number DESC LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let head = head
                .map(|(number, hash)| DataHash::from_hex(&hash).map(|h| (number, h)))
                .transpose()?;
            check_append(head, &block, &transaction)?;

            let taken: bool = db_tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM transactions WHERE tx_id = ?1)",
                params![transaction.tx_id().as_str()],
                |row| row.get(0),
            )?;
            if taken {
                return Err(StoreError::DuplicateTransaction(transaction.tx_id().to_string()));
            }

            insert_block(&db_tx, &block)?;
            insert_transaction(&db_tx, &transaction)?;
            db_tx.commit()?;

            tracing::debug!(
                block = block.number,
                tx_id = %transaction.tx_id(),
                data_hash = %block.data_hash,
                "committed block"
            );
            Ok(())
        })
        .await
    }

    async fn get_block(&self, number: u64) -> Result<Option<Block>> {
        self.run(move |conn| {
            let sql = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE block_number = ?1");
            let row = conn.query_row(&sql, params![number], read_block_row).optional()?;
            row.map(Block::try_from).transpose()
        })
        .await
    }

    async fn chain_range(&self, start: u64, end: u64) -> Result<Vec<ChainEntry>> {
        self.run(move |conn| {
            read_range(conn, start, end)?
                .into_iter()
                .map(|stored| match stored {
                    StoredBlock::Intact(entry) => Ok(entry),
                    StoredBlock::Undecodable { number, reason } => Err(StoreError::InvalidData(
                        format!("block {number}: {reason}"),
                    )),
                })
                .collect()
        })
        .await
    }

    async fn replay_range(&self, start: u64, end: u64) -> Result<Vec<StoredBlock>> {
        self.run(move |conn| read_range(conn, start, end)).await
    }

    async fn get_transaction(&self, tx_id: &TxId) -> Result<Option<Transaction>> {
        let tx_id = tx_id.clone();
        self.run(move |conn| {
            let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE tx_id = ?1");
            let row = conn
                .query_row(&sql, params![tx_id.as_str()], read_transaction_row)
                .optional()?;
            row.map(Transaction::try_from).transpose()
        })
        .await
    }

    async fn transactions_for_block(&self, number: u64) -> Result<Vec<Transaction>> {
        self.run(move |conn| {
            query_transactions(
                conn,
                &format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions
                     WHERE block_number = ?1 ORDER BY timestamp, tx_id"
                ),
                params![number],
            )
        })
        .await
    }

    async fn transactions_for_document(&self, document_id: &str) -> Result<Vec<Transaction>> {
        let document_id = document_id.to_string();
        self.run(move |conn| {
            query_transactions(
                conn,
                &format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions
                     WHERE document_id = ?1 ORDER BY timestamp, block_number"
                ),
                params![document_id],
            )
        })
        .await
    }

    async fn transactions_between(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<Transaction>> {
        self.run(move |conn| {
            // Fixed-width timestamps compare correctly as text.
            let mut conditions = Vec::new();
            let mut bounds = Vec::new();
            if let Some(start) = start {
                bounds.push(format_timestamp(&start));
                conditions.push(format!("timestamp >= ?{}", bounds.len()));
            }
            if let Some(end) = end {
                bounds.push(format_timestamp(&end));
                conditions.push(format!("timestamp <= ?{}", bounds.len()));
            }
            let filter = if conditions.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", conditions.join(" AND "))
            };
            query_transactions(
                conn,
                &format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions {filter}
                     ORDER BY timestamp, block_number"
                ),
                params_from_iter(bounds.iter()),
            )
        })
        .await
    }
}
