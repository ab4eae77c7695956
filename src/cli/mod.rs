//! Command-line parsing for the Korea market dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the data-pipeline code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "krdash",
    version,
    about = "Korea market dashboard (KOSPI, USD/KRW, policy rates)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI dashboard.
    ///
    /// This is the default when the binary is run with no subcommand. It uses
    /// the same underlying data pipeline as `krdash show`, but renders results
    /// in a terminal UI using Ratatui.
    Dash(DashArgs),
    /// Fetch, align, and print a one-shot summary to stdout.
    Show(ShowArgs),
    /// Fetch, align, and write the combined table to a CSV file.
    Export(ExportArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Parser, Clone)]
pub struct CommonArgs {
    /// First day of the data window (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-01")]
    pub start: NaiveDate,

    /// Last day of the data window (YYYY-MM-DD; defaults to today).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Rebase price columns so their first value is 100 (enabled by default).
    #[arg(long, default_value_t = true)]
    pub normalize: bool,

    /// Keep raw price levels instead of rebasing to 100.
    #[arg(long)]
    pub no_normalize: bool,

    /// FRED API key. Falls back to the FRED_API_KEY environment variable.
    #[arg(long, value_name = "KEY")]
    pub fred_key: Option<String>,

    /// ECOS API key. Falls back to the ECOS_API_KEY environment variable.
    #[arg(long, value_name = "KEY")]
    pub ecos_key: Option<String>,

    /// Seconds a fetched series stays cached within the session.
    #[arg(long, value_name = "SECONDS", default_value_t = 900)]
    pub cache_ttl: u64,
}

/// Options for the interactive dashboard.
#[derive(Debug, Parser)]
pub struct DashArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options for the one-shot stdout summary.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Print the tail of the aligned table.
    #[arg(long)]
    pub table: bool,

    /// Number of table rows to print.
    #[arg(long, default_value_t = 30)]
    pub rows: usize,

    /// Render an ASCII chart in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Chart height (rows per panel).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for CSV export.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output path (defaults to market_dashboard_<today>.csv).
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}
