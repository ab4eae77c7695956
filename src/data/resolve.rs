//! Ordered-fallback resolution across interchangeable sources.
//!
//! Candidates are tried in order; the first one returning a series that is
//! non-empty and carries at least one value wins, and later candidates are
//! never invoked. Exhausting the list yields an empty series tagged
//! `ResolvedSource::Unavailable`.

use crate::domain::{Frequency, NamedSeries, ResolvedSource};

/// One candidate in a fallback chain.
pub trait SeriesSource {
    /// Human-readable provenance, e.g. `"EFFR via CSV (daily)"`.
    fn label(&self) -> String;

    /// Attempt the fetch. Failures must come back as an empty series.
    fn fetch(&self) -> NamedSeries;
}

/// Outcome of a resolution: the winning series (renamed to the logical
/// name) and where it came from.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub series: NamedSeries,
    pub source: ResolvedSource,
}

/// Try `candidates` in order and return the first usable series.
pub fn resolve(logical_name: &str, candidates: &[&dyn SeriesSource]) -> Resolution {
    for candidate in candidates {
        let label = candidate.label();
        let series = candidate.fetch();
        if series.is_empty() || !series.has_values() {
            log::debug!("{logical_name}: {label} returned nothing usable, trying next");
            continue;
        }
        log::info!("{logical_name}: resolved via {label} ({} points)", series.len());
        return Resolution {
            series: series.renamed(logical_name),
            source: ResolvedSource::Via(label),
        };
    }

    log::warn!("{logical_name}: every source failed, column will be empty");
    Resolution {
        series: NamedSeries::empty(logical_name, Frequency::Daily),
        source: ResolvedSource::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawObservation;
    use chrono::NaiveDate;
    use std::cell::Cell;

    struct StubSource {
        label: &'static str,
        series: NamedSeries,
        calls: Cell<usize>,
    }

    impl StubSource {
        fn new(label: &'static str, series: NamedSeries) -> Self {
            Self {
                label,
                series,
                calls: Cell::new(0),
            }
        }
    }

    impl SeriesSource for StubSource {
        fn label(&self) -> String {
            self.label.to_string()
        }

        fn fetch(&self) -> NamedSeries {
            self.calls.set(self.calls.get() + 1);
            self.series.clone()
        }
    }

    fn valued_series(name: &str) -> NamedSeries {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        NamedSeries::from_observations(
            name,
            Frequency::Monthly,
            vec![RawObservation::new(date, Some(3.5))],
        )
    }

    fn placeholder_series(name: &str) -> NamedSeries {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        NamedSeries::from_observations(
            name,
            Frequency::Monthly,
            vec![RawObservation::new(date, None)],
        )
    }

    #[test]
    fn first_usable_candidate_wins_and_later_ones_are_not_called() {
        let first = StubSource::new("primary", valued_series("raw"));
        let second = StubSource::new("secondary", valued_series("raw"));

        let resolution = resolve("US Fed Funds (%)", &[&first, &second]);

        assert_eq!(resolution.series.name, "US Fed Funds (%)");
        assert_eq!(resolution.source, ResolvedSource::Via("primary".to_string()));
        assert_eq!(first.calls.get(), 1);
        assert_eq!(second.calls.get(), 0);
    }

    #[test]
    fn empty_and_valueless_candidates_are_skipped() {
        let empty = StubSource::new("empty", NamedSeries::empty("raw", Frequency::Daily));
        let placeholders = StubSource::new("placeholders", placeholder_series("raw"));
        let usable = StubSource::new("usable", valued_series("raw"));

        let resolution = resolve("BOK Base Rate (%)", &[&empty, &placeholders, &usable]);

        assert_eq!(resolution.source, ResolvedSource::Via("usable".to_string()));
        assert_eq!(empty.calls.get(), 1);
        assert_eq!(placeholders.calls.get(), 1);
        assert_eq!(usable.calls.get(), 1);
    }

    #[test]
    fn exhausted_chain_is_unavailable() {
        let first = StubSource::new("a", NamedSeries::empty("raw", Frequency::Daily));
        let second = StubSource::new("b", placeholder_series("raw"));

        let resolution = resolve("US Fed Funds (%)", &[&first, &second]);

        assert!(resolution.source.is_unavailable());
        assert_eq!(resolution.source.label(), "unavailable");
        assert!(resolution.series.is_empty());
        assert_eq!(resolution.series.name, "US Fed Funds (%)");
    }

    #[test]
    fn no_candidates_is_unavailable() {
        let resolution = resolve("US Fed Funds (%)", &[]);
        assert!(resolution.source.is_unavailable());
        assert!(resolution.series.is_empty());
    }
}
