//! CLI argument parsing for the lead scoring workbench.
//!
//! The CLI is intentionally thin: both commands feed the same orchestration
//! components, so policy lives with them rather than here.
use crate::params::{DEFAULT_AVG_SALES_PER_MONTH, DEFAULT_SAFE_GUARD};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for the scoring workflow.
#[derive(Parser, Debug)]
#[command(
    name = "leadscore",
    version,
    about = "Email lead scoring workbench against a remote scoring service",
    after_help = "Commands:\n  run      Interactive scoring session (terminal UI)\n  analyze  One-shot scoring run, rendered to stdout\n\nExamples:\n  leadscore run --endpoint http://localhost:8000\n  leadscore analyze --endpoint http://localhost:8000 --safe-guard 0.85\n  leadscore analyze --upload subscribers.csv --out-dir /tmp",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Analyze(AnalyzeArgs),
}

/// Interactive session inputs.
#[derive(Parser, Debug)]
#[command(about = "Interactive lead scoring session")]
pub struct RunArgs {
    /// Scoring service base URL (falls back to LEAD_SCORING_ENDPOINT)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Leads CSV used by the default source mode
    #[arg(long, value_name = "PATH")]
    pub leads: Option<PathBuf>,

    /// Directory for downloaded strategy files
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Headless one-shot inputs.
#[derive(Parser, Debug)]
#[command(about = "Run one scoring analysis and print the results")]
pub struct AnalyzeArgs {
    /// Scoring service base URL (falls back to LEAD_SCORING_ENDPOINT)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Leads CSV used by the default source mode
    #[arg(long, value_name = "PATH")]
    pub leads: Option<PathBuf>,

    /// Score an operator-supplied CSV instead of the bundled leads
    #[arg(long, value_name = "PATH")]
    pub upload: Option<PathBuf>,

    /// Estimated monthly email sales in dollars
    #[arg(long, value_name = "N", default_value_t = DEFAULT_AVG_SALES_PER_MONTH)]
    pub sales: u64,

    /// Fraction of monthly sales the strategy must preserve (0.0..=1.0)
    #[arg(long, value_name = "F", default_value_t = DEFAULT_SAFE_GUARD)]
    pub safe_guard: f64,

    /// Directory for the strategy CSV (defaults to the downloads directory)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}
