//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use docchain::{Action, EventBuilder, Ledger, LedgerConfig, Result, TxId};
use docchain_store::MemoryStore;

/// A ledger over a fresh memory store, mining at difficulty 1.
pub struct TestFixture {
    pub ledger: Ledger<MemoryStore>,
}

impl TestFixture {
    /// Create a fixture with the cheap test configuration.
    pub async fn new() -> Result<Self> {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: LedgerConfig) -> Result<Self> {
        let ledger = Ledger::open(MemoryStore::new(), config).await?;
        Ok(Self { ledger })
    }

    /// Record `action` on `document` by `operator`, with a generated summary.
    pub async fn record(&self, document: &str, operator: &str, action: Action) -> Result<TxId> {
        self.ledger
            .record_event(event(document, operator, action))
            .await
    }

    /// Record the same action on `document` once for each operator.
    pub async fn record_many(
        &self,
        document: &str,
        operators: &[&str],
        action: Action,
    ) -> Result<Vec<TxId>> {
        let mut ids = Vec::with_capacity(operators.len());
        for operator in operators {
            ids.push(self.record(document, operator, action).await?);
        }
        Ok(ids)
    }
}

/// Difficulty 1 keeps mining to a handful of digests per block.
pub fn test_config() -> LedgerConfig {
    LedgerConfig::default().with_difficulty(1)
}

/// A complete event with a certificate and a short summary.
pub fn event(document: &str, operator: &str, action: Action) -> EventBuilder {
    EventBuilder::new(action)
        .operator(operator)
        .certificate("SHA1:00:11:22:33")
        .document(document)
        .summary(format!("{action} of {document} by {operator}"))
}
