use anyhow::{bail, Context};
use chrono::NaiveDate;
use docchain::core::{format_timestamp, parse_timestamp};
use docchain::store::SqliteStore;
use docchain::{
    AuditReport, ChainEntry, EventBuilder, Ledger, LedgerConfig, LedgerError, Timestamp,
    Transaction, ValidationReport,
};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ledger = open_ledger(&cli).await?;
    let format = cli.format;

    match cli.command {
        Command::Record(args) => cmd_record(&ledger, args, format).await,
        Command::History(args) => cmd_history(&ledger, args, format).await,
        Command::Report(args) => cmd_report(&ledger, args, format).await,
        Command::Validate => cmd_validate(&ledger, format).await,
        Command::ShowBlock(args) => cmd_show_block(&ledger, args, format).await,
    }
}

async fn open_ledger(cli: &Cli) -> anyhow::Result<Ledger<SqliteStore>> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(difficulty) = cli.difficulty {
        config = config.with_difficulty(difficulty);
    }
    tracing::debug!(db = %cli.db.display(), difficulty = config.difficulty, "opening ledger");
    Ledger::open_path(&cli.db, config)
        .await
        .with_context(|| format!("opening ledger at {}", cli.db.display()))
}

async fn cmd_record(
    ledger: &Ledger<SqliteStore>,
    args: RecordArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let event = EventBuilder::new(args.action.into())
        .operator(args.operator)
        .certificate(args.certificate)
        .document(args.document)
        .summary(args.summary)
        .signature(args.signature);

    let tx_id = ledger.record_event(event).await?;
    let block = ledger
        .transaction(&tx_id)
        .await?
        .map(|tx| tx.block_number)
        .context("recorded transaction is missing from the store")?;
    match format {
        OutputFormat::Text => println!("Recorded {tx_id} in block #{block}"),
        OutputFormat::Json => print_json(&serde_json::json!({
            "tx_id": tx_id,
            "block_number": block,
        }))?,
    }
    Ok(())
}

async fn cmd_history(
    ledger: &Ledger<SqliteStore>,
    args: HistoryArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let history = ledger.history_of(&args.document).await?;
    match format {
        OutputFormat::Text => print!("{}", render_history(&args.document, &history)),
        OutputFormat::Json => print_json(&history)?,
    }
    Ok(())
}

async fn cmd_report(
    ledger: &Ledger<SqliteStore>,
    args: ReportArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let start = args
        .from
        .as_deref()
        .map(|s| parse_bound(s, Bound::Start))
        .transpose()?;
    let end = args
        .to
        .as_deref()
        .map(|s| parse_bound(s, Bound::End))
        .transpose()?;

    let report = ledger.report(start, end).await?;
    match format {
        OutputFormat::Text => print!("{}", render_report(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

async fn cmd_validate(ledger: &Ledger<SqliteStore>, format: OutputFormat) -> anyhow::Result<()> {
    let report = ledger.validate().await?;
    match format {
        OutputFormat::Text => print!("{}", render_validation(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    if let Some(violation) = report.first_violation {
        return Err(LedgerError::Integrity(violation).into());
    }
    Ok(())
}

async fn cmd_show_block(
    ledger: &Ledger<SqliteStore>,
    args: ShowBlockArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let Some(entry) = ledger.block(args.number).await? else {
        bail!("block #{} does not exist", args.number);
    };
    match format {
        OutputFormat::Text => print!("{}", render_block(&entry)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "block": entry.block,
            "transactions": entry.transactions,
        }))?,
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Date bounds
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Parse a report bound. Accepts anything [`parse_timestamp`] does; a bare
/// date used as an upper bound covers the whole day.
pub fn parse_bound(input: &str, bound: Bound) -> Result<Timestamp, LedgerError> {
    let input = input.trim();
    if bound == Bound::End {
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_micro_opt(23, 59, 59, 999_999) {
                return Ok(naive.and_utc());
            }
        }
    }
    parse_timestamp(input).map_err(|_| {
        LedgerError::InvalidInput(format!(
            "invalid date bound {input:?}: expected YYYY-MM-DD or an ISO-8601 datetime"
        ))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Text rendering
// ─────────────────────────────────────────────────────────────────────────────

fn render_history(document: &str, history: &[Transaction]) -> String {
    if history.is_empty() {
        return format!("No events recorded for {document}\n");
    }
    let mut out = format!("History of {document} ({} events)\n", history.len());
    for tx in history {
        out.push_str(&format!(
            "  #{:<6} {}  {:<7} by {}  [{}]\n",
            tx.block_number,
            format_timestamp(tx.timestamp()),
            tx.action().as_str(),
            tx.operator_id().unwrap_or("-"),
            tx.tx_id(),
        ));
        if !tx.body.data_summary.is_empty() {
            out.push_str(&format!("          {}\n", tx.body.data_summary));
        }
    }
    out
}

fn render_report(report: &AuditReport) -> String {
    let bound =
        |ts: Option<Timestamp>| ts.map_or_else(|| "*".to_string(), |t| format_timestamp(&t));
    let mut out = format!(
        "Audit report generated {}\nPeriod: {} .. {}\nTotal operations: {}\n",
        format_timestamp(&report.generated),
        bound(report.period.start),
        bound(report.period.end),
        report.total_operations,
    );
    out.push_str("By type:\n");
    for (kind, count) in &report.operations_by_type {
        out.push_str(&format!("  {kind:<24} {count}\n"));
    }
    out.push_str("By operator:\n");
    for (operator, count) in &report.operations_by_operator {
        out.push_str(&format!("  {operator:<24} {count}\n"));
    }
    out
}

fn render_validation(report: &ValidationReport) -> String {
    match &report.first_violation {
        None => format!("chain valid ({} blocks)\n", report.blocks_checked),
        Some(violation) => format!(
            "chain INVALID at block #{}: {}\n",
            violation.block_number, violation.reason
        ),
    }
}

fn render_block(entry: &ChainEntry) -> String {
    let block = &entry.block;
    let mut out = format!(
        "Block #{}\n  timestamp:     {}\n  previous_hash: {}\n  data_hash:     {}\n  merkle_root:   {}\n  nonce:         {}\n  difficulty:    {}\n  miner:         {}\n",
        block.number,
        format_timestamp(&block.timestamp),
        block.previous_hash,
        block.data_hash,
        block.merkle_root,
        block.nonce,
        block.difficulty,
        block.miner,
    );
    for tx in &entry.transactions {
        out.push_str(&format!(
            "  tx {} {} document={} operator={}\n",
            tx.tx_id(),
            tx.body.operation_type,
            tx.document_id().unwrap_or("-"),
            tx.operator_id().unwrap_or("-"),
        ));
    }
    out
}
