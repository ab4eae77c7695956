//! ECOS (Bank of Korea) adapter for the base rate.
//!
//! The StatisticSearch endpoint nests rows under a container key whose
//! casing has drifted across API revisions; field names inside each row have
//! drifted too. The parser probes a short alias list for each and takes the
//! first that exists, so older and newer payload shapes both decode.
//!
//! Monthly periods arrive as `YYYYMM` strings and are stamped on the last
//! calendar day of the month.

use chrono::{Months, NaiveDate};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::data::fetch::{FetchFailure, blocking_client};
use crate::domain::{Frequency, NamedSeries, RawObservation};
use crate::error::AppError;

const BASE_URL: &str = "https://ecos.bok.or.kr/api";

/// Statistic and item identifying the BOK base rate.
pub const BASE_RATE_STAT: &str = "722Y001";
pub const BASE_RATE_ITEM: &str = "0101000";

const CONTAINER_ALIASES: [&str; 3] = ["StatisticSearch", "statisticSearch", "Statisticsearch"];
const TIME_ALIASES: [&str; 3] = ["TIME", "time", "TIME_PERIOD"];
const VALUE_ALIASES: [&str; 3] = ["DATA_VALUE", "data_value", "OBS_VALUE"];

pub struct EcosClient {
    client: Client,
    base_url: String,
}

impl EcosClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        Ok(Self {
            client: blocking_client()?,
            base_url: base_url.into(),
        })
    }

    /// Fetch the monthly base rate between `start` and `end`.
    ///
    /// An empty `api_key` returns the empty series immediately, with no
    /// request issued. Any failure is logged and absorbed the same way.
    pub fn fetch_base_rate(&self, api_key: &str, start: NaiveDate, end: NaiveDate) -> NamedSeries {
        let name = format!("{BASE_RATE_STAT}/{BASE_RATE_ITEM}");
        let Some(url) = self.statistic_url(api_key, start, end) else {
            log::debug!("skipping ECOS: no API key configured");
            return NamedSeries::empty(name, Frequency::Monthly);
        };

        match self.try_statistic(&url) {
            Ok(observations) => NamedSeries::from_observations(name, Frequency::Monthly, observations),
            Err(err) => {
                log::warn!("ECOS fetch for {name} failed: {err}");
                NamedSeries::empty(name, Frequency::Monthly)
            }
        }
    }

    /// The StatisticSearch URL, or `None` when no key is configured.
    ///
    /// The key is a path segment, so the URL must never be logged.
    pub fn statistic_url(&self, api_key: &str, start: NaiveDate, end: NaiveDate) -> Option<String> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return None;
        }
        Some(format!(
            "{}/StatisticSearch/{api_key}/json/kr/1/100000/{BASE_RATE_STAT}/M/{}/{}/{BASE_RATE_ITEM}",
            self.base_url,
            start.format("%Y%m"),
            end.format("%Y%m"),
        ))
    }

    fn try_statistic(&self, url: &str) -> Result<Vec<RawObservation>, FetchFailure> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchFailure::Network(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchFailure::Status(resp.status()));
        }

        let body: Value = resp
            .json()
            .map_err(|e| FetchFailure::Malformed(e.without_url().to_string()))?;

        parse_statistic(&body)
    }
}

fn parse_statistic(body: &Value) -> Result<Vec<RawObservation>, FetchFailure> {
    let container = CONTAINER_ALIASES
        .iter()
        .find_map(|key| body.get(key))
        .ok_or_else(|| FetchFailure::Malformed("no StatisticSearch container".into()))?;

    let rows = match container.get("row").and_then(Value::as_array) {
        Some(rows) => rows,
        // A container without rows is how ECOS reports "no data here".
        None => return Ok(Vec::new()),
    };

    let mut observations = Vec::new();
    for row in rows {
        let Some(period) = field(row, &TIME_ALIASES) else {
            continue;
        };
        let Some(raw_value) = field(row, &VALUE_ALIASES) else {
            continue;
        };
        let trimmed = raw_value.trim();
        if trimmed.is_empty() || trimmed == "." {
            continue;
        }
        let Ok(value) = trimmed.parse::<f64>() else {
            continue;
        };
        let Some(date) = month_end_from_period(&period) else {
            continue;
        };
        observations.push(RawObservation::new(date, Some(value)));
    }
    Ok(observations)
}

/// Look up the first alias present in `row`, stringifying numbers.
fn field(row: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Map a `YYYYMM` period to the last calendar day of that month.
fn month_end_from_period(period: &str) -> Option<NaiveDate> {
    let period = period.trim();
    if period.len() < 6 {
        return None;
    }
    let year: i32 = period[..4].parse().ok()?;
    let month: u32 = period[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}
