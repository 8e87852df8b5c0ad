use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docchain::Action;

#[derive(Parser)]
#[command(
    name = "docchain",
    about = "DocChain: tamper-evident audit ledger for document events",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database holding the chain
    #[arg(long, global = true, env = "DOCCHAIN_DB", default_value = "audit-blockchain.db")]
    pub db: PathBuf,

    /// TOML file with ledger settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the mining difficulty for new blocks
    #[arg(long, global = true)]
    pub difficulty: Option<u32>,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Repeat for more log output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a document event as a new block
    Record(RecordArgs),
    /// Show every event recorded for a document
    History(HistoryArgs),
    /// Tally events inside a time window
    Report(ReportArgs),
    /// Replay the chain and report the first tampered block
    Validate,
    /// Show one block with its transaction
    ShowBlock(ShowBlockArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ActionArg {
    Export,
    Sign,
    Verify,
    Update,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Export => Action::Export,
            ActionArg::Sign => Action::Sign,
            ActionArg::Verify => Action::Verify,
            ActionArg::Update => Action::Update,
        }
    }
}

#[derive(Args)]
pub struct RecordArgs {
    #[arg(long)]
    pub operator: String,
    /// Certificate thumbprint of the operator
    #[arg(long)]
    pub certificate: String,
    #[arg(long)]
    pub document: String,
    #[arg(long, default_value = "")]
    pub summary: String,
    #[arg(long, value_enum, default_value = "export")]
    pub action: ActionArg,
    #[arg(long)]
    pub signature: Option<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub document: String,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Inclusive lower bound (RFC 3339, naive UTC, or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// Inclusive upper bound; a bare date means the end of that day
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args)]
pub struct ShowBlockArgs {
    pub number: u64,
}
