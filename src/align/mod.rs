//! Calendar alignment of heterogeneous series.
//!
//! - builds the dense daily index between the window endpoints, inclusive
//! - stretches each series onto that index under a per-column fill policy
//! - observations dated before the window never seed the fill
//! - columns with no values anywhere in the window are omitted

use chrono::NaiveDate;

use crate::domain::{AlignedTable, Column, FillPolicy, NamedSeries};

/// One series to place on the shared index, with its fill policy.
pub struct ColumnSpec<'a> {
    pub series: &'a NamedSeries,
    pub fill: FillPolicy,
}

/// Align `specs` onto the dense daily calendar from `start` to `end`.
pub fn align(specs: &[ColumnSpec<'_>], start: NaiveDate, end: NaiveDate) -> AlignedTable {
    let index = date_range(start, end);

    let mut columns = Vec::with_capacity(specs.len());
    for spec in specs {
        let values = fill_series(spec.series, &index, spec.fill);
        if values.iter().all(Option::is_none) {
            log::debug!("omitting column {}: no data in the window", spec.series.name);
            continue;
        }
        columns.push(Column {
            name: spec.series.name.clone(),
            values,
        });
    }

    AlignedTable::new(index, columns)
}

/// Every calendar day from `start` to `end`, inclusive. Empty when
/// `start > end`.
fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

fn fill_series(series: &NamedSeries, index: &[NaiveDate], policy: FillPolicy) -> Vec<Option<f64>> {
    let points = series.points();
    let Some(window_start) = index.first() else {
        return Vec::new();
    };

    // Carry starts blank at the window edge: an observation from before the
    // window must not appear inside it.
    let mut cursor = points.partition_point(|(date, _)| date < window_start);
    let mut carry: Option<f64> = None;

    let mut values = Vec::with_capacity(index.len());
    for day in index {
        // Placeholder points advance the cursor without touching the carry.
        while cursor < points.len() && points[cursor].0 <= *day {
            if let Some(v) = points[cursor].1 {
                carry = Some(v);
            }
            cursor += 1;
        }
        values.push(carry);
    }

    match policy {
        // On a dense daily index a monthly series forward-fills exactly like
        // a daily one, so the two policies share the pass above.
        FillPolicy::ForwardOnly | FillPolicy::MonthlyForward => {}
        FillPolicy::ForwardAndBackward => back_fill_leading(&mut values),
    }

    values
}

/// Give the leading missing run the first observed value. After a forward
/// pass the only missing slots form a leading prefix.
fn back_fill_leading(values: &mut [Option<f64>]) {
    let Some(first) = values.iter().find_map(|value| *value) else {
        return;
    };
    for slot in values.iter_mut() {
        if slot.is_some() {
            break;
        }
        *slot = Some(first);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, RawObservation};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(name: &str, points: &[(NaiveDate, Option<f64>)]) -> NamedSeries {
        NamedSeries::from_observations(
            name,
            Frequency::Daily,
            points
                .iter()
                .map(|(date, value)| RawObservation::new(*date, *value))
                .collect(),
        )
    }

    #[test]
    fn index_is_dense_and_inclusive() {
        let series = daily("a", &[(d(2024, 1, 1), Some(1.0))]);
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::ForwardOnly,
        }];
        let table = align(&specs, d(2024, 1, 1), d(2024, 1, 10));

        assert_eq!(table.len(), 10);
        assert_eq!(table.index()[0], d(2024, 1, 1));
        assert_eq!(table.index()[9], d(2024, 1, 10));
    }

    #[test]
    fn forward_fill_carries_over_weekends() {
        // 2024-01-05 is a Friday.
        let series = daily(
            "px",
            &[(d(2024, 1, 5), Some(100.0)), (d(2024, 1, 8), Some(102.0))],
        );
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::ForwardOnly,
        }];
        let table = align(&specs, d(2024, 1, 5), d(2024, 1, 8));

        let column = table.column("px").unwrap();
        assert_eq!(
            column.values,
            vec![Some(100.0), Some(100.0), Some(100.0), Some(102.0)]
        );
    }

    #[test]
    fn forward_only_leaves_the_leading_gap_missing() {
        let series = daily("px", &[(d(2024, 1, 3), Some(7.0))]);
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::ForwardOnly,
        }];
        let table = align(&specs, d(2024, 1, 1), d(2024, 1, 4));

        let column = table.column("px").unwrap();
        assert_eq!(column.values, vec![None, None, Some(7.0), Some(7.0)]);
    }

    #[test]
    fn observations_before_the_window_never_seed_the_fill() {
        let series = daily(
            "px",
            &[(d(2023, 12, 29), Some(5.0)), (d(2024, 1, 3), Some(7.0))],
        );
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::ForwardOnly,
        }];
        let table = align(&specs, d(2024, 1, 1), d(2024, 1, 4));

        let column = table.column("px").unwrap();
        assert_eq!(column.values, vec![None, None, Some(7.0), Some(7.0)]);
    }

    #[test]
    fn backward_pass_fills_only_the_leading_gap() {
        // The December observation is outside the window; the leading gap
        // takes the first in-window value, not the pre-window one.
        let series = daily(
            "px",
            &[(d(2023, 12, 29), Some(5.0)), (d(2024, 1, 3), Some(7.0))],
        );
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::ForwardAndBackward,
        }];
        let table = align(&specs, d(2024, 1, 1), d(2024, 1, 4));

        let column = table.column("px").unwrap();
        assert_eq!(
            column.values,
            vec![Some(7.0), Some(7.0), Some(7.0), Some(7.0)]
        );
    }

    #[test]
    fn placeholder_points_do_not_reset_the_carry() {
        let series = daily(
            "rate",
            &[
                (d(2024, 1, 2), Some(1.0)),
                (d(2024, 1, 3), None),
                (d(2024, 1, 4), None),
            ],
        );
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::ForwardOnly,
        }];
        let table = align(&specs, d(2024, 1, 2), d(2024, 1, 4));

        let column = table.column("rate").unwrap();
        assert_eq!(column.values, vec![Some(1.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn monthly_observations_carry_between_month_ends() {
        let series = NamedSeries::from_observations(
            "bok",
            Frequency::Monthly,
            vec![
                RawObservation::new(d(2024, 1, 31), Some(3.5)),
                RawObservation::new(d(2024, 2, 29), Some(3.75)),
            ],
        );
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::MonthlyForward,
        }];
        let table = align(&specs, d(2024, 1, 30), d(2024, 3, 2));

        let column = table.column("bok").unwrap();
        assert_eq!(column.values[0], None); // Jan 30
        assert_eq!(column.values[1], Some(3.5)); // Jan 31
        assert_eq!(column.values[15], Some(3.5)); // Feb 14
        assert_eq!(column.values[30], Some(3.75)); // Feb 29
        assert_eq!(column.values[32], Some(3.75)); // Mar 2
    }

    #[test]
    fn columns_with_no_window_data_are_omitted() {
        let empty = NamedSeries::empty("empty", Frequency::Daily);
        let placeholders = daily("placeholders", &[(d(2024, 1, 2), None)]);
        let out_of_window = daily("early", &[(d(2023, 6, 1), Some(9.0))]);
        let kept = daily("kept", &[(d(2024, 1, 2), Some(1.0))]);

        let specs = [
            ColumnSpec {
                series: &empty,
                fill: FillPolicy::ForwardOnly,
            },
            ColumnSpec {
                series: &placeholders,
                fill: FillPolicy::ForwardAndBackward,
            },
            ColumnSpec {
                series: &out_of_window,
                fill: FillPolicy::ForwardOnly,
            },
            ColumnSpec {
                series: &kept,
                fill: FillPolicy::ForwardOnly,
            },
        ];
        let table = align(&specs, d(2024, 1, 1), d(2024, 1, 5));

        assert_eq!(table.columns().len(), 1);
        assert_eq!(table.columns()[0].name, "kept");
    }

    #[test]
    fn inverted_window_yields_an_empty_table() {
        let series = daily("px", &[(d(2024, 1, 2), Some(1.0))]);
        let specs = [ColumnSpec {
            series: &series,
            fill: FillPolicy::ForwardOnly,
        }];
        let table = align(&specs, d(2024, 1, 10), d(2024, 1, 1));

        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }
}
