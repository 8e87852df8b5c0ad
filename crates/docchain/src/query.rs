//! Read-side queries: document history and aggregate audit reports.

use std::collections::BTreeMap;

use docchain_core::{now, Timestamp, Transaction};
use docchain_store::Store;
use serde::Serialize;

use crate::error::Result;

/// Operator bucket for transactions recorded without one (genesis).
pub const SYSTEM_OPERATOR: &str = "system";

/// Reporting window; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

/// Plain tallies over the transactions in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub generated: Timestamp,
    pub period: ReportPeriod,
    pub total_operations: u64,
    pub operations_by_type: BTreeMap<String, u64>,
    pub operations_by_operator: BTreeMap<String, u64>,
}

impl AuditReport {
    /// Tally `transactions`, which are assumed to lie inside `period`.
    pub fn tally<'a>(
        period: ReportPeriod,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Self {
        let mut report = Self {
            generated: now(),
            period,
            total_operations: 0,
            operations_by_type: BTreeMap::new(),
            operations_by_operator: BTreeMap::new(),
        };
        for tx in transactions {
            report.total_operations += 1;
            *report
                .operations_by_type
                .entry(tx.body.operation_type.clone())
                .or_default() += 1;
            *report
                .operations_by_operator
                .entry(tx.operator_id().unwrap_or(SYSTEM_OPERATOR).to_string())
                .or_default() += 1;
        }
        report
    }
}

/// Every transaction on `document_id`, oldest first.
pub async fn history_of<S: Store + ?Sized>(
    store: &S,
    document_id: &str,
) -> Result<Vec<Transaction>> {
    Ok(store.transactions_for_document(document_id).await?)
}

/// Tally transactions with `start <= timestamp <= end`.
pub async fn report<S: Store + ?Sized>(
    store: &S,
    start: Option<Timestamp>,
    end: Option<Timestamp>,
) -> Result<AuditReport> {
    let transactions = store.transactions_between(start, end).await?;
    Ok(AuditReport::tally(
        ReportPeriod { start, end },
        &transactions,
    ))
}
