//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - produced by any source adapter without adapter-specific baggage
//! - aligned and rebased without knowing where the data came from
//! - rendered to reports, CSV, or charts from one shared table shape

use chrono::NaiveDate;

/// One parsed upstream record.
///
/// `value` is `None` when the upstream row exists but carries a placeholder
/// (FRED publishes `"."` for unobserved days). Keeping the row preserves the
/// distinction between "no row" and "row with no value".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl RawObservation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Native cadence of a series as published by its source.
///
/// This tags what the upstream publishes; how a series is stretched onto the
/// daily calendar is decided separately by `FillPolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Monthly,
}

impl Frequency {
    pub fn display_name(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Monthly => "monthly",
        }
    }
}

/// A named time series with possibly-missing values.
///
/// Points are strictly increasing by date with no duplicates; construction
/// sorts and deduplicates (the later observation wins). An empty series is the
/// uniform "nothing usable" result of every failed or skipped fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub frequency: Frequency,
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl NamedSeries {
    /// The empty series: what adapters return on any failure.
    pub fn empty(name: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            frequency,
            points: Vec::new(),
        }
    }

    /// Build a series from parsed records, sorting by date and keeping the
    /// last record for any duplicated date.
    pub fn from_observations(
        name: impl Into<String>,
        frequency: Frequency,
        observations: Vec<RawObservation>,
    ) -> Self {
        let mut points: Vec<(NaiveDate, Option<f64>)> = observations
            .into_iter()
            .map(|obs| (obs.date, obs.value))
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points.dedup_by(|later, earlier| {
            if later.0 == earlier.0 {
                // dedup_by drops `later`; keep its value in the surviving slot.
                earlier.1 = later.1;
                true
            } else {
                false
            }
        });
        Self {
            name: name.into(),
            frequency,
            points,
        }
    }

    pub fn points(&self) -> &[(NaiveDate, Option<f64>)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether at least one point carries a value.
    pub fn has_values(&self) -> bool {
        self.points.iter().any(|(_, value)| value.is_some())
    }

    /// Date of the newest point that carries a value.
    ///
    /// This is the "last native observation" shown next to a source caption,
    /// taken before calendar alignment stretches the series.
    pub fn last_value_date(&self) -> Option<NaiveDate> {
        self.points
            .iter()
            .rev()
            .find(|(_, value)| value.is_some())
            .map(|(date, _)| *date)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Where a column's data actually came from.
///
/// `Unavailable` (every candidate exhausted) is deliberately distinguishable
/// from a resolved source whose data is merely stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// A candidate won; the string is its human-readable provenance label.
    Via(String),
    /// No candidate produced a usable series.
    Unavailable,
}

impl ResolvedSource {
    pub const UNAVAILABLE: &'static str = "unavailable";

    pub fn label(&self) -> &str {
        match self {
            ResolvedSource::Via(label) => label,
            ResolvedSource::Unavailable => Self::UNAVAILABLE,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ResolvedSource::Unavailable)
    }
}

/// How a series is stretched onto the dense daily calendar.
///
/// The set is closed on purpose: callers pick a policy per column instead of
/// the aligner inferring one from series names or cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Carry the last observed value forward; days before the first
    /// in-window observation stay missing.
    ForwardOnly,
    /// Forward fill, then give the leading gap the first observed value.
    /// The backward pass can show a value on days before it was first
    /// observed inside the window.
    ForwardAndBackward,
    /// Forward fill from month-end observations; no backward pass.
    MonthlyForward,
}

/// One column of the aligned table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// The newest non-missing value, if any.
    pub fn last_value(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|value| *value)
    }
}

/// Series aligned onto one dense daily index.
///
/// Every column has exactly `index.len()` values. Columns with no data in the
/// window are omitted entirely, so a table can end up with zero columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl AlignedTable {
    /// Assemble a table. Callers must supply columns whose value vectors
    /// match the index length.
    pub fn new(index: Vec<NaiveDate>, columns: Vec<Column>) -> Self {
        Self { index, columns }
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Number of rows (calendar days) in the table.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    /// Rescale the named columns so each one's first non-missing value
    /// becomes 100. Columns not named, columns with no values, and columns
    /// whose first value is exactly zero pass through unchanged.
    pub fn rebased(&self, names: &[&str]) -> AlignedTable {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                if !names.contains(&column.name.as_str()) {
                    return column.clone();
                }
                let Some(base) = column.values.iter().find_map(|value| *value) else {
                    return column.clone();
                };
                if base == 0.0 {
                    return column.clone();
                }
                Column {
                    name: column.name.clone(),
                    values: column
                        .values
                        .iter()
                        .map(|value| value.map(|v| v / base * 100.0))
                        .collect(),
                }
            })
            .collect();

        AlignedTable {
            index: self.index.clone(),
            columns,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags plus environment defaults.
#[derive(Debug, Clone)]
pub struct DashConfig {
    /// First calendar day of the dashboard window.
    pub start: NaiveDate,
    /// Last calendar day; `None` means the invocation date.
    pub end: Option<NaiveDate>,
    /// Rebase the level columns (index, FX) to 100 at their first value.
    pub normalize: bool,
    /// Whether the table view starts visible.
    pub show_table: bool,
    /// Rows shown in table views.
    pub table_rows: usize,
    /// FRED API key; empty means "not configured" (the API candidates skip
    /// themselves without a network call).
    pub fred_api_key: String,
    /// ECOS API key; empty means "not configured".
    pub ecos_api_key: String,
}

impl DashConfig {
    /// The effective end of the window.
    pub fn end_date(&self) -> NaiveDate {
        self.end
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_observations_sorts_by_date() {
        let series = NamedSeries::from_observations(
            "s",
            Frequency::Daily,
            vec![
                RawObservation::new(d(2024, 1, 3), Some(3.0)),
                RawObservation::new(d(2024, 1, 1), Some(1.0)),
                RawObservation::new(d(2024, 1, 2), Some(2.0)),
            ],
        );
        let dates: Vec<NaiveDate> = series.points().iter().map(|(date, _)| *date).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
    }

    #[test]
    fn from_observations_keeps_last_duplicate() {
        let series = NamedSeries::from_observations(
            "s",
            Frequency::Daily,
            vec![
                RawObservation::new(d(2024, 1, 1), Some(1.0)),
                RawObservation::new(d(2024, 1, 1), Some(9.0)),
            ],
        );
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0], (d(2024, 1, 1), Some(9.0)));
    }

    #[test]
    fn has_values_distinguishes_placeholder_only_series() {
        let placeholders = NamedSeries::from_observations(
            "s",
            Frequency::Daily,
            vec![
                RawObservation::new(d(2024, 1, 1), None),
                RawObservation::new(d(2024, 1, 2), None),
            ],
        );
        assert!(!placeholders.is_empty());
        assert!(!placeholders.has_values());
        assert!(NamedSeries::empty("e", Frequency::Daily).is_empty());
    }

    #[test]
    fn last_value_date_skips_trailing_placeholders() {
        let series = NamedSeries::from_observations(
            "s",
            Frequency::Daily,
            vec![
                RawObservation::new(d(2024, 1, 1), Some(1.0)),
                RawObservation::new(d(2024, 1, 2), Some(2.0)),
                RawObservation::new(d(2024, 1, 3), None),
            ],
        );
        assert_eq!(series.last_value_date(), Some(d(2024, 1, 2)));
    }

    #[test]
    fn renamed_keeps_points() {
        let series = NamedSeries::from_observations(
            "raw",
            Frequency::Daily,
            vec![RawObservation::new(d(2024, 1, 1), Some(1.0))],
        )
        .renamed("KOSPI");
        assert_eq!(series.name, "KOSPI");
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn unavailable_label_is_the_sentinel() {
        assert_eq!(ResolvedSource::Unavailable.label(), "unavailable");
        assert!(ResolvedSource::Unavailable.is_unavailable());
        let via = ResolvedSource::Via("EFFR via FRED API (daily)".to_string());
        assert_eq!(via.label(), "EFFR via FRED API (daily)");
        assert!(!via.is_unavailable());
    }

    #[test]
    fn rebased_scales_first_value_to_100() {
        let table = AlignedTable::new(
            vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)],
            vec![Column {
                name: "KOSPI".to_string(),
                values: vec![Some(50.0), Some(100.0), Some(150.0)],
            }],
        );
        let rebased = table.rebased(&["KOSPI"]);
        assert_eq!(
            rebased.column("KOSPI").unwrap().values,
            vec![Some(100.0), Some(200.0), Some(300.0)]
        );
    }

    #[test]
    fn rebased_uses_first_present_value_as_base() {
        let table = AlignedTable::new(
            vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)],
            vec![Column {
                name: "KOSPI".to_string(),
                values: vec![None, Some(50.0), Some(75.0)],
            }],
        );
        let rebased = table.rebased(&["KOSPI"]);
        assert_eq!(
            rebased.column("KOSPI").unwrap().values,
            vec![None, Some(100.0), Some(150.0)]
        );
    }

    #[test]
    fn rebased_zero_base_passes_through() {
        let table = AlignedTable::new(
            vec![d(2024, 1, 1), d(2024, 1, 2)],
            vec![Column {
                name: "KOSPI".to_string(),
                values: vec![Some(0.0), Some(10.0)],
            }],
        );
        let rebased = table.rebased(&["KOSPI"]);
        assert_eq!(
            rebased.column("KOSPI").unwrap().values,
            vec![Some(0.0), Some(10.0)]
        );
    }

    #[test]
    fn rebased_leaves_unnamed_columns_alone() {
        let table = AlignedTable::new(
            vec![d(2024, 1, 1), d(2024, 1, 2)],
            vec![
                Column {
                    name: "KOSPI".to_string(),
                    values: vec![Some(50.0), Some(100.0)],
                },
                Column {
                    name: "BOK Base Rate (%)".to_string(),
                    values: vec![Some(3.5), Some(3.5)],
                },
            ],
        );
        let rebased = table.rebased(&["KOSPI"]);
        assert_eq!(
            rebased.column("BOK Base Rate (%)").unwrap().values,
            vec![Some(3.5), Some(3.5)]
        );
    }

    #[test]
    fn column_last_value_skips_missing_tail() {
        let column = Column {
            name: "c".to_string(),
            values: vec![Some(1.0), Some(2.0), None],
        };
        assert_eq!(column.last_value(), Some(2.0));
    }
}
