//! Export the aligned table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::AlignedTable;
use crate::error::AppError;

/// The conventional export filename, stamped with today's date.
pub fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "market_dashboard_{}.csv",
        chrono::Local::now().date_naive()
    ))
}

/// Write the aligned table to a CSV file. Missing cells become empty fields.
pub fn write_table_csv(path: &Path, table: &AlignedTable) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            3,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;

    let mut header = String::from("Date");
    for column in table.columns() {
        header.push(',');
        header.push_str(&column.name);
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::new(3, format!("Failed to write export CSV header: {e}")))?;

    for (i, date) in table.index().iter().enumerate() {
        let mut row = date.to_string();
        for column in table.columns() {
            row.push(',');
            if let Some(v) = column.values[i] {
                row.push_str(&format!("{v:.4}"));
            }
        }
        writeln!(file, "{row}")
            .map_err(|e| AppError::new(3, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Column;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_table() -> AlignedTable {
        AlignedTable::new(
            vec![d(2024, 1, 2), d(2024, 1, 3)],
            vec![
                Column {
                    name: "KOSPI".to_string(),
                    values: vec![Some(2650.321), None],
                },
                Column {
                    name: "BOK Base Rate (%)".to_string(),
                    values: vec![Some(3.5), Some(3.5)],
                },
            ],
        )
    }

    #[test]
    fn export_writes_header_rows_and_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_table_csv(&path, &sample_table()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,KOSPI,BOK Base Rate (%)");
        assert_eq!(lines[1], "2024-01-02,2650.3210,3.5000");
        assert_eq!(lines[2], "2024-01-03,,3.5000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn export_to_an_unwritable_path_fails_with_exit_code_3() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = write_table_csv(&path, &sample_table()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn default_export_path_carries_todays_date() {
        let path = default_export_path();
        let name = path.to_string_lossy();
        assert!(name.starts_with("market_dashboard_"));
        assert!(name.ends_with(".csv"));
    }
}
