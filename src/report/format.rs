//! Formatted terminal output for `krdash show`.
//!
//! We keep formatting code in one place so:
//! - the fetch/align code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::{MarketData, SourceStatus};
use crate::domain::{AlignedTable, DashConfig};

/// Format the full run summary (window, latest values, source captions).
pub fn format_summary(data: &MarketData, config: &DashConfig) -> String {
    let mut out = String::new();

    out.push_str("=== Korea Market Dashboard ===\n");
    out.push_str(&format!(
        "Window: {} -> {}\n",
        config.start,
        config.end_date()
    ));
    if config.normalize {
        out.push_str("Prices rebased to 100 at their first value in the window.\n");
    }

    if data.table.is_empty() {
        out.push_str("\nNo data for the selected period.\n");
    } else {
        out.push_str(&format!("Rows: {}\n", data.table.len()));
        out.push_str(&format!("Latest: {}\n", format_last_values(&data.table)));
    }

    out.push('\n');
    out.push_str(&format!(
        "US rate source: {}\n",
        format_source_caption(&data.fed)
    ));
    out.push_str(&format!(
        "BOK rate source: {}\n",
        format_source_caption(&data.bok)
    ));

    if data.fed.source.is_unavailable() {
        out.push_str("warning: US policy rate could not be loaded from any source.\n");
    }
    if data.bok.source.is_unavailable() {
        if config.ecos_api_key.trim().is_empty() {
            out.push_str("Set ECOS_API_KEY to enable the BOK base rate.\n");
        } else {
            out.push_str("warning: BOK base rate could not be loaded from ECOS.\n");
        }
    }

    out
}

/// One line of the latest value per column, e.g.
/// `KOSPI 2650.32 | US Fed Funds (%) 5.33`.
pub fn format_last_values(table: &AlignedTable) -> String {
    let parts: Vec<String> = table
        .columns()
        .iter()
        .map(|column| format!("{} {}", column.name, fmt_cell(column.last_value())))
        .collect();
    parts.join(" | ")
}

/// Provenance caption for a rate column, with the native observation date
/// when one exists.
pub fn format_source_caption(status: &SourceStatus) -> String {
    match status.last_native_obs {
        Some(date) => format!("{} | last obs: {date}", status.source.label()),
        None => status.source.label().to_string(),
    }
}

/// Format the last `rows` rows of the aligned table.
pub fn format_table(table: &AlignedTable, rows: usize) -> String {
    let mut out = String::new();

    let mut header = format!("{:<12}", "Date");
    for column in table.columns() {
        header.push_str(&format!(" {:>16}", column.name));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<12}", "");
    for _ in table.columns() {
        rule.push_str(&format!(" {:-<16}", ""));
    }
    out.push_str(&rule);
    out.push('\n');

    let skip = table.len().saturating_sub(rows);
    for (i, date) in table.index().iter().enumerate().skip(skip) {
        let mut row = format!("{:<12}", date.format("%Y-%m-%d").to_string());
        for column in table.columns() {
            row.push_str(&format!(" {:>16}", fmt_cell(column.values[i])));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out
}

fn fmt_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "NA".to_string(),
    }
}
