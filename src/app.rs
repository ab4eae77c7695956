//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into a `DashConfig`
//! - runs the fetch/resolve/align pipeline
//! - dispatches to the TUI, the stdout summary, or the CSV export

use std::time::Duration;

use clap::Parser;

use crate::cli::{Command, CommonArgs, ExportArgs, ShowArgs};
use crate::data::FetchCache;
use crate::domain::DashConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `krdash` binary.
pub fn run() -> Result<(), AppError> {
    // Keys may live in a local .env; a missing file is fine.
    let _ = dotenvy::dotenv();
    init_logging();

    // We want `krdash` and `krdash --start 2021-01-01` to behave like
    // `krdash dash ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Dash(args) => crate::tui::run(args),
        Command::Show(args) => handle_show(args),
        Command::Export(args) => handle_export(args),
    }
}

fn init_logging() {
    // RUST_LOG controls verbosity; default to warnings so the TUI stays quiet.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let mut config = dash_config_from_args(&args.common);
    config.show_table = args.table;
    config.table_rows = args.rows;

    let cache = FetchCache::new(Duration::from_secs(args.common.cache_ttl));
    let data = pipeline::load_dashboard(&config, &cache)?;

    println!("{}", crate::report::format_summary(&data, &config));

    if !data.table.is_empty() {
        if args.plot && !args.no_plot {
            let chart = crate::plot::render_ascii_chart(
                &data.table,
                &pipeline::LEVEL_COLUMNS,
                args.width,
                args.height,
            );
            println!("{chart}");
        }
        if args.table {
            println!("{}", crate::report::format_table(&data.table, args.rows));
        }
    }

    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let config = dash_config_from_args(&args.common);
    let cache = FetchCache::new(Duration::from_secs(args.common.cache_ttl));
    let data = pipeline::load_dashboard(&config, &cache)?;

    let path = args.out.unwrap_or_else(crate::io::export::default_export_path);
    crate::io::export::write_table_csv(&path, &data.table)?;
    println!("Wrote {} rows to {}", data.table.len(), path.display());

    Ok(())
}

/// Build the pipeline configuration from CLI flags plus environment defaults.
pub fn dash_config_from_args(args: &CommonArgs) -> DashConfig {
    DashConfig {
        start: args.start,
        end: args.end,
        normalize: args.normalize && !args.no_normalize,
        show_table: false,
        table_rows: 30,
        fred_api_key: key_or_env(args.fred_key.as_deref(), "FRED_API_KEY"),
        ecos_api_key: key_or_env(args.ecos_key.as_deref(), "ECOS_API_KEY"),
    }
}

fn key_or_env(flag: Option<&str>, var: &str) -> String {
    match flag {
        Some(key) => key.trim().to_string(),
        None => std::env::var(var).map(|k| k.trim().to_string()).unwrap_or_default(),
    }
}

/// Rewrite argv so `krdash` defaults to `krdash dash`.
///
/// Rules:
/// - `krdash`                        -> `krdash dash`
/// - `krdash --start 2021-01-01 ...` -> `krdash dash --start 2021-01-01 ...`
/// - `krdash --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dash".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "dash" | "show" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "dash flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dash".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
