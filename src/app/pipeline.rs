//! Shared data pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch (quotes/FRED/ECOS) -> fallback resolution -> calendar alignment -> rebase
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! Source failures surface as missing columns and "unavailable" captions, not
//! as errors: the only `Err` out of here is an HTTP client that cannot be
//! built at all.

use chrono::NaiveDate;

use crate::align::{ColumnSpec, align};
use crate::data::{
    EcosClient, FetchCache, FetchKey, FredClient, QuoteClient, Resolution, SeriesSource, resolve,
};
use crate::domain::{AlignedTable, DashConfig, FillPolicy, Frequency, NamedSeries, ResolvedSource};
use crate::error::AppError;

pub const SYMBOL_KOSPI: &str = "^KS11";
pub const SYMBOL_USDKRW: &str = "KRW=X";

pub const COL_KOSPI: &str = "KOSPI";
pub const COL_USDKRW: &str = "USD/KRW";
pub const COL_FED: &str = "US Fed Funds (%)";
pub const COL_BOK: &str = "BOK Base Rate (%)";

/// Price-level columns; these are the ones `normalize` rebases to 100.
pub const LEVEL_COLUMNS: [&str; 2] = [COL_KOSPI, COL_USDKRW];
/// Policy-rate columns, plotted against the percent axis.
pub const RATE_COLUMNS: [&str; 2] = [COL_FED, COL_BOK];

/// Where a rate column's data came from, for the UI captions.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub source: ResolvedSource,
    /// Newest native observation, taken before alignment stretches the
    /// series across the calendar.
    pub last_native_obs: Option<NaiveDate>,
}

/// All computed outputs of a single dashboard load.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub table: AlignedTable,
    pub fed: SourceStatus,
    pub bok: SourceStatus,
}

/// Execute the full pipeline: fetch every series, resolve fallbacks, and
/// align onto the shared daily calendar.
pub fn load_dashboard(config: &DashConfig, cache: &FetchCache) -> Result<MarketData, AppError> {
    let quotes = QuoteClient::new()?;
    let fred = FredClient::new()?;
    let ecos = EcosClient::new()?;

    let end = config.end_date();

    // 1) Market quotes.
    let kospi =
        fetch_quote(&quotes, cache, SYMBOL_KOSPI, config.start, end).renamed(COL_KOSPI);
    let usdkrw =
        fetch_quote(&quotes, cache, SYMBOL_USDKRW, config.start, end).renamed(COL_USDKRW);

    // 2) Policy rates through their fallback chains.
    let fed = resolve_fed(&fred, cache, &config.fred_api_key, config.start);
    let bok = resolve_bok(&ecos, cache, &config.ecos_api_key, config.start, end);

    let fed_status = SourceStatus {
        last_native_obs: fed.series.last_value_date(),
        source: fed.source,
    };
    let bok_status = SourceStatus {
        last_native_obs: bok.series.last_value_date(),
        source: bok.source,
    };

    // 3) Align; columns with nothing in the window drop out here.
    let specs = [
        ColumnSpec {
            series: &kospi,
            fill: FillPolicy::ForwardOnly,
        },
        ColumnSpec {
            series: &usdkrw,
            fill: FillPolicy::ForwardOnly,
        },
        ColumnSpec {
            series: &fed.series,
            fill: FillPolicy::ForwardAndBackward,
        },
        ColumnSpec {
            series: &bok.series,
            fill: FillPolicy::MonthlyForward,
        },
    ];
    let mut table = align(&specs, config.start, end);

    if config.normalize {
        table = table.rebased(&LEVEL_COLUMNS);
    }

    Ok(MarketData {
        table,
        fed: fed_status,
        bok: bok_status,
    })
}

fn fetch_quote(
    client: &QuoteClient,
    cache: &FetchCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> NamedSeries {
    let key = FetchKey {
        source: "quote",
        identifier: symbol.to_string(),
        start: Some(start),
        credential: String::new(),
    };
    cache.get_or_fetch(key, || client.fetch_history(symbol, start, end))
}

/// US policy rate, preferring the daily effective rate over the monthly
/// average and the authenticated API over the public CSV export.
fn resolve_fed(
    client: &FredClient,
    cache: &FetchCache,
    api_key: &str,
    start: NaiveDate,
) -> Resolution {
    let effr_api = FredApiSource {
        client,
        cache,
        series_id: "EFFR",
        frequency: Frequency::Daily,
        api_key,
        start,
        label: "EFFR via FRED API (daily)",
    };
    let effr_csv = FredCsvSource {
        client,
        cache,
        series_id: "EFFR",
        frequency: Frequency::Daily,
        label: "EFFR via CSV (daily)",
    };
    let fedfunds_api = FredApiSource {
        client,
        cache,
        series_id: "FEDFUNDS",
        frequency: Frequency::Monthly,
        api_key,
        start,
        label: "FEDFUNDS via FRED API (monthly avg)",
    };
    let fedfunds_csv = FredCsvSource {
        client,
        cache,
        series_id: "FEDFUNDS",
        frequency: Frequency::Monthly,
        label: "FEDFUNDS via CSV (monthly avg)",
    };

    let candidates: [&dyn SeriesSource; 4] = [&effr_api, &effr_csv, &fedfunds_api, &fedfunds_csv];
    resolve(COL_FED, &candidates)
}

fn resolve_bok(
    client: &EcosClient,
    cache: &FetchCache,
    api_key: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Resolution {
    let ecos = EcosSource {
        client,
        cache,
        api_key,
        start,
        end,
    };
    let candidates: [&dyn SeriesSource; 1] = [&ecos];
    resolve(COL_BOK, &candidates)
}

struct FredApiSource<'a> {
    client: &'a FredClient,
    cache: &'a FetchCache,
    series_id: &'static str,
    frequency: Frequency,
    api_key: &'a str,
    start: NaiveDate,
    label: &'static str,
}

impl SeriesSource for FredApiSource<'_> {
    fn label(&self) -> String {
        self.label.to_string()
    }

    fn fetch(&self) -> NamedSeries {
        let key = FetchKey {
            source: "fred-api",
            identifier: self.series_id.to_string(),
            start: Some(self.start),
            credential: self.api_key.to_string(),
        };
        self.cache.get_or_fetch(key, || {
            self.client
                .fetch_observations(self.series_id, self.frequency, self.api_key, self.start)
        })
    }
}

struct FredCsvSource<'a> {
    client: &'a FredClient,
    cache: &'a FetchCache,
    series_id: &'static str,
    frequency: Frequency,
    label: &'static str,
}

impl SeriesSource for FredCsvSource<'_> {
    fn label(&self) -> String {
        self.label.to_string()
    }

    fn fetch(&self) -> NamedSeries {
        // The CSV export is full-history; alignment trims to the window.
        let key = FetchKey {
            source: "fred-csv",
            identifier: self.series_id.to_string(),
            start: None,
            credential: String::new(),
        };
        self.cache
            .get_or_fetch(key, || self.client.fetch_graph_csv(self.series_id, self.frequency))
    }
}

struct EcosSource<'a> {
    client: &'a EcosClient,
    cache: &'a FetchCache,
    api_key: &'a str,
    start: NaiveDate,
    end: NaiveDate,
}

impl SeriesSource for EcosSource<'_> {
    fn label(&self) -> String {
        format!(
            "{}/{} via ECOS API (monthly)",
            crate::data::BASE_RATE_STAT,
            crate::data::BASE_RATE_ITEM
        )
    }

    fn fetch(&self) -> NamedSeries {
        let key = FetchKey {
            source: "ecos",
            identifier: format!(
                "{}/{}",
                crate::data::BASE_RATE_STAT,
                crate::data::BASE_RATE_ITEM
            ),
            start: Some(self.start),
            credential: self.api_key.to_string(),
        };
        self.cache
            .get_or_fetch(key, || self.client.fetch_base_rate(self.api_key, self.start, self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fed_chain_with_no_key_and_dead_endpoints_is_unavailable() {
        let client =
            FredClient::with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();
        let cache = FetchCache::new(Duration::from_secs(60));

        let resolution = resolve_fed(&client, &cache, "", d(2020, 1, 1));

        assert!(resolution.source.is_unavailable());
        assert!(resolution.series.is_empty());
        assert_eq!(resolution.series.name, COL_FED);
    }

    #[test]
    fn bok_chain_without_key_is_unavailable_and_labeled() {
        let client = EcosClient::with_base_url("http://127.0.0.1:9").unwrap();
        let cache = FetchCache::new(Duration::from_secs(60));

        let resolution = resolve_bok(&client, &cache, "", d(2020, 1, 1), d(2024, 5, 31));

        assert!(resolution.source.is_unavailable());
        assert_eq!(resolution.source.label(), "unavailable");

        let ecos = EcosSource {
            client: &client,
            cache: &cache,
            api_key: "",
            start: d(2020, 1, 1),
            end: d(2024, 5, 31),
        };
        assert_eq!(ecos.label(), "722Y001/0101000 via ECOS API (monthly)");
    }
}
