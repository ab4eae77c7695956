//! Quote-history adapter for the chart API serving index and FX symbols.
//!
//! Fetches daily closes from the v8 chart endpoint. The adjusted close is
//! preferred when the payload carries it, otherwise the raw close column is
//! used. The upstream has no official contract and fails in creative ways;
//! every failure degrades to an empty series.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::fetch::{FetchFailure, blocking_client};
use crate::domain::{Frequency, NamedSeries, RawObservation};
use crate::error::AppError;

const BASE_URL: &str = "https://query2.finance.yahoo.com";

/// v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartOuter,
}

#[derive(Debug, Deserialize)]
struct ChartOuter {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    adjclose: Vec<Option<f64>>,
}

pub struct QuoteClient {
    client: Client,
    base_url: String,
}

impl QuoteClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        Ok(Self {
            client: blocking_client()?,
            base_url: base_url.into(),
        })
    }

    /// Fetch daily closes for `symbol` over `[start, end]`.
    ///
    /// Null entries (non-trading days) are dropped. Any failure returns the
    /// empty series.
    pub fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> NamedSeries {
        match self.try_fetch(symbol, start, end) {
            Ok(observations) => {
                NamedSeries::from_observations(symbol, Frequency::Daily, observations)
            }
            Err(err) => {
                log::warn!("quote fetch for {symbol} failed: {err}");
                NamedSeries::empty(symbol, Frequency::Daily)
            }
        }
    }

    fn try_fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawObservation>, FetchFailure> {
        let url = self.chart_url(symbol, start, end);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchFailure::Status(resp.status()));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| FetchFailure::Malformed(e.to_string()))?;

        parse_chart(body)
    }

    /// Build the chart API URL for a symbol and date range.
    pub fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let period1 = day_start_timestamp(start);
        // period2 is exclusive; midnight after `end` covers the whole end day.
        let period2 = day_start_timestamp(end.checked_add_days(Days::new(1)).unwrap_or(end));
        format!(
            "{}/v8/finance/chart/{symbol}?period1={period1}&period2={period2}&interval=1d&includeAdjustedClose=true",
            self.base_url
        )
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    NaiveDateTime::new(date, NaiveTime::MIN).and_utc().timestamp()
}

fn parse_chart(body: ChartResponse) -> Result<Vec<RawObservation>, FetchFailure> {
    let result = body.chart.result.ok_or_else(|| match body.chart.error {
        Some(err) => FetchFailure::Malformed(format!("{}: {}", err.code, err.description)),
        None => FetchFailure::Malformed("empty result with no error".to_string()),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| FetchFailure::Malformed("result array is empty".to_string()))?;

    let Some(timestamps) = data.timestamp else {
        // No trading days in the window: a valid, empty payload.
        return Ok(Vec::new());
    };

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| FetchFailure::Malformed("no quote data".to_string()))?;

    // Column-level preference: use the adjusted close column when present,
    // not a per-row fallback between the two.
    let values = data
        .indicators
        .adjclose
        .and_then(|blocks| blocks.into_iter().next())
        .map(|block| block.adjclose)
        .unwrap_or(quote.close);

    let mut observations = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| FetchFailure::Malformed(format!("invalid timestamp: {ts}")))?;

        let Some(value) = values.get(i).copied().flatten() else {
            continue;
        };
        observations.push(RawObservation::new(date, Some(value)));
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2024-01-02 and 2024-01-03 at 00:00 UTC.
    const TS_JAN2: i64 = 1704153600;
    const TS_JAN3: i64 = 1704240000;

    #[test]
    fn parse_prefers_adjusted_close_column() {
        let json = format!(
            r#"{{"chart":{{"result":[{{"timestamp":[{TS_JAN2},{TS_JAN3}],
                "indicators":{{"quote":[{{"close":[2500.0,2510.0]}}],
                "adjclose":[{{"adjclose":[2499.0,2509.0]}}]}}}}],"error":null}}}}"#
        );
        let body: ChartResponse = serde_json::from_str(&json).unwrap();
        let observations = parse_chart(body).unwrap();
        assert_eq!(
            observations,
            vec![
                RawObservation::new(d(2024, 1, 2), Some(2499.0)),
                RawObservation::new(d(2024, 1, 3), Some(2509.0)),
            ]
        );
    }

    #[test]
    fn parse_falls_back_to_close_without_adjclose() {
        let json = format!(
            r#"{{"chart":{{"result":[{{"timestamp":[{TS_JAN2}],
                "indicators":{{"quote":[{{"close":[1378.5]}}]}}}}],"error":null}}}}"#
        );
        let body: ChartResponse = serde_json::from_str(&json).unwrap();
        let observations = parse_chart(body).unwrap();
        assert_eq!(
            observations,
            vec![RawObservation::new(d(2024, 1, 2), Some(1378.5))]
        );
    }

    #[test]
    fn parse_skips_null_entries() {
        let json = format!(
            r#"{{"chart":{{"result":[{{"timestamp":[{TS_JAN2},{TS_JAN3}],
                "indicators":{{"quote":[{{"close":[null,2510.0]}}]}}}}],"error":null}}}}"#
        );
        let body: ChartResponse = serde_json::from_str(&json).unwrap();
        let observations = parse_chart(body).unwrap();
        assert_eq!(
            observations,
            vec![RawObservation::new(d(2024, 1, 3), Some(2510.0))]
        );
    }

    #[test]
    fn parse_rejects_error_payload() {
        let json = r#"{"chart":{"result":null,
            "error":{"code":"Not Found","description":"No data found"}}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let err = parse_chart(body).unwrap_err();
        assert!(matches!(err, FetchFailure::Malformed(_)));
    }

    #[test]
    fn parse_accepts_payload_without_timestamps() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[]}]}}],"error":null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(parse_chart(body).unwrap().is_empty());
    }

    #[test]
    fn chart_url_carries_symbol_and_window() {
        let client = QuoteClient::with_base_url("http://example.test").unwrap();
        let url = client.chart_url("^KS11", d(2024, 1, 2), d(2024, 1, 3));
        assert!(url.starts_with("http://example.test/v8/finance/chart/^KS11?"));
        assert!(url.contains(&format!("period1={TS_JAN2}")));
        // exclusive end: midnight of Jan 4.
        assert!(url.contains("period2=1704326400"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn fetch_history_absorbs_connection_failure() {
        let client = QuoteClient::with_base_url("http://127.0.0.1:9").unwrap();
        let series = client.fetch_history("^KS11", d(2024, 1, 2), d(2024, 1, 3));
        assert!(series.is_empty());
        assert_eq!(series.name, "^KS11");
    }
}
