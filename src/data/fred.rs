//! FRED adapters for the fed funds series.
//!
//! Two routes to the same data, tried in the order the caller wires them:
//!
//! - the authenticated observations API (JSON, honors `observation_start`)
//! - the public fredgraph CSV export (no credential, full history)
//!
//! The API route skips itself without a network call when no key is
//! configured. The CSV route keeps FRED's `"."` placeholder rows as missing
//! values; the API route drops them, matching what each endpoint's consumers
//! conventionally see.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::fetch::{FetchFailure, blocking_client};
use crate::domain::{Frequency, NamedSeries, RawObservation};
use crate::error::AppError;

const API_BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const CSV_BASE_URL: &str = "https://fred.stlouisfed.org/graph/fredgraph.csv";

pub struct FredClient {
    client: Client,
    api_base: String,
    csv_base: String,
}

impl FredClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_urls(API_BASE_URL, CSV_BASE_URL)
    }

    pub fn with_base_urls(
        api_base: impl Into<String>,
        csv_base: impl Into<String>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            client: blocking_client()?,
            api_base: api_base.into(),
            csv_base: csv_base.into(),
        })
    }

    /// Fetch observations from the authenticated API.
    ///
    /// An empty `api_key` returns the empty series immediately, with no
    /// request issued. Placeholder observations are dropped.
    pub fn fetch_observations(
        &self,
        series_id: &str,
        frequency: Frequency,
        api_key: &str,
        start: NaiveDate,
    ) -> NamedSeries {
        let Some(url) = self.observations_url(series_id, api_key, start) else {
            log::debug!("skipping FRED API for {series_id}: no API key configured");
            return NamedSeries::empty(series_id, frequency);
        };

        match self.try_observations(&url) {
            Ok(observations) => NamedSeries::from_observations(series_id, frequency, observations),
            Err(err) => {
                log::warn!("FRED API fetch for {series_id} failed: {err}");
                NamedSeries::empty(series_id, frequency)
            }
        }
    }

    /// Fetch the full-history CSV export for `series_id`.
    ///
    /// Placeholder cells (`"."`) are kept as missing values.
    pub fn fetch_graph_csv(&self, series_id: &str, frequency: Frequency) -> NamedSeries {
        let url = format!("{}?id={series_id}", self.csv_base);
        match self.try_graph_csv(series_id, &url) {
            Ok(observations) => NamedSeries::from_observations(series_id, frequency, observations),
            Err(err) => {
                log::warn!("FRED CSV fetch for {series_id} failed: {err}");
                NamedSeries::empty(series_id, frequency)
            }
        }
    }

    /// The observations API URL, or `None` when no key is configured.
    pub fn observations_url(
        &self,
        series_id: &str,
        api_key: &str,
        start: NaiveDate,
    ) -> Option<String> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return None;
        }
        Some(format!(
            "{}?series_id={series_id}&api_key={api_key}&file_type=json&observation_start={start}",
            self.api_base
        ))
    }

    fn try_observations(&self, url: &str) -> Result<Vec<RawObservation>, FetchFailure> {
        // The URL carries the API key; reqwest error text embeds the URL, so
        // strip it before the message can reach a log line.
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchFailure::Network(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchFailure::Status(resp.status()));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| FetchFailure::Malformed(e.without_url().to_string()))?;

        parse_observations(body)
    }

    fn try_graph_csv(&self, series_id: &str, url: &str) -> Result<Vec<RawObservation>, FetchFailure> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchFailure::Status(resp.status()));
        }

        let body = resp
            .text()
            .map_err(|e| FetchFailure::Malformed(e.to_string()))?;

        parse_graph_csv(series_id, &body)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

fn parse_observations(body: ObservationsResponse) -> Result<Vec<RawObservation>, FetchFailure> {
    let mut observations = Vec::with_capacity(body.observations.len());
    for obs in body.observations {
        let value = match parse_value(&obs.value) {
            Some(v) => v,
            None => continue,
        };
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| FetchFailure::Malformed(format!("invalid date '{}': {e}", obs.date)))?;
        observations.push(RawObservation::new(date, Some(value)));
    }
    Ok(observations)
}

fn parse_graph_csv(series_id: &str, body: &str) -> Result<Vec<RawObservation>, FetchFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FetchFailure::Malformed(format!("bad CSV header: {e}")))?
        .clone();

    // The first header may carry a UTF-8 BOM.
    let date_idx = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == "DATE");
    let value_idx = headers.iter().position(|h| h == series_id);
    let (Some(date_idx), Some(value_idx)) = (date_idx, value_idx) else {
        return Err(FetchFailure::Malformed(format!(
            "CSV is missing the DATE or {series_id} column"
        )));
    };

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| FetchFailure::Malformed(format!("bad CSV row: {e}")))?;
        let Some(raw_date) = record.get(date_idx) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| FetchFailure::Malformed(format!("invalid date '{raw_date}': {e}")))?;
        let value = record.get(value_idx).and_then(parse_value);
        observations.push(RawObservation::new(date, value));
    }
    Ok(observations)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_value_handles_placeholders() {
        assert_eq!(parse_value("5.33"), Some(5.33));
        assert_eq!(parse_value(" 5.33 "), Some(5.33));
        assert_eq!(parse_value("."), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("  "), None);
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value("inf"), None);
        assert_eq!(parse_value("not-a-number"), None);
    }

    #[test]
    fn parse_observations_drops_placeholder_rows() {
        let body: ObservationsResponse = serde_json::from_str(
            r#"{"observations":[
                {"date":"2024-01-02","value":"5.33"},
                {"date":"2024-01-03","value":"."},
                {"date":"2024-01-04","value":"5.34"}
            ]}"#,
        )
        .unwrap();
        let observations = parse_observations(body).unwrap();
        assert_eq!(
            observations,
            vec![
                RawObservation::new(d(2024, 1, 2), Some(5.33)),
                RawObservation::new(d(2024, 1, 4), Some(5.34)),
            ]
        );
    }

    #[test]
    fn parse_observations_rejects_bad_dates() {
        let body: ObservationsResponse = serde_json::from_str(
            r#"{"observations":[{"date":"01/02/2024","value":"5.33"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            parse_observations(body),
            Err(FetchFailure::Malformed(_))
        ));
    }

    #[test]
    fn parse_graph_csv_keeps_placeholder_cells_as_missing() {
        let body = "DATE,EFFR\n2024-01-02,5.33\n2024-01-03,.\n2024-01-04,5.34\n";
        let observations = parse_graph_csv("EFFR", body).unwrap();
        assert_eq!(
            observations,
            vec![
                RawObservation::new(d(2024, 1, 2), Some(5.33)),
                RawObservation::new(d(2024, 1, 3), None),
                RawObservation::new(d(2024, 1, 4), Some(5.34)),
            ]
        );
    }

    #[test]
    fn parse_graph_csv_requires_the_series_column() {
        let body = "DATE,SOMETHING_ELSE\n2024-01-02,5.33\n";
        assert!(matches!(
            parse_graph_csv("EFFR", body),
            Err(FetchFailure::Malformed(_))
        ));
    }

    #[test]
    fn parse_graph_csv_strips_header_bom() {
        let body = "\u{feff}DATE,FEDFUNDS\n2024-01-01,5.33\n";
        let observations = parse_graph_csv("FEDFUNDS", body).unwrap();
        assert_eq!(observations.len(), 1);
    }

    #[test]
    fn observations_url_refuses_empty_credentials() {
        let client = FredClient::with_base_urls("http://api.test", "http://csv.test").unwrap();
        assert_eq!(client.observations_url("EFFR", "", d(2020, 1, 1)), None);
        assert_eq!(client.observations_url("EFFR", "   ", d(2020, 1, 1)), None);

        let url = client
            .observations_url("EFFR", "secret", d(2020, 1, 1))
            .unwrap();
        assert!(url.contains("series_id=EFFR"));
        assert!(url.contains("api_key=secret"));
        assert!(url.contains("file_type=json"));
        assert!(url.contains("observation_start=2020-01-01"));
    }

    #[test]
    fn fetch_observations_without_key_returns_empty() {
        // Base URL points nowhere reachable: with no key the adapter must
        // short-circuit before any request could be attempted.
        let client = FredClient::with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();
        let series = client.fetch_observations("EFFR", Frequency::Daily, "", d(2020, 1, 1));
        assert!(series.is_empty());
    }

    #[test]
    fn fetch_graph_csv_absorbs_connection_failure() {
        let client = FredClient::with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();
        let series = client.fetch_graph_csv("EFFR", Frequency::Daily);
        assert!(series.is_empty());
        assert_eq!(series.name, "EFFR");
    }
}
