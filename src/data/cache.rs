//! Session-scoped fetch cache.
//!
//! Interactive refreshes hit the same upstream endpoints repeatedly; this
//! cache keeps each fetched series for a TTL so toggling display options does
//! not re-download anything. Empty results are cached like any other: a dead
//! endpoint is not probed again until the entry expires.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::domain::NamedSeries;

pub const DEFAULT_TTL: Duration = Duration::from_secs(900);

/// Identity of one fetch. Two fetches share a cache slot only when every
/// field matches, so changing the window or the credential refetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    /// Adapter tag, e.g. `"quote"` or `"fred-csv"`.
    pub source: &'static str,
    /// Symbol or series identifier within the adapter.
    pub identifier: String,
    /// Window start, when the request carries one.
    pub start: Option<NaiveDate>,
    /// Credential the request was made with (empty for public endpoints).
    pub credential: String,
}

struct CacheEntry {
    series: NamedSeries,
    fetched_at: Instant,
}

pub struct FetchCache {
    ttl: Duration,
    entries: RefCell<HashMap<FetchKey, CacheEntry>>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached series for `key`, or run `fetch` and cache its
    /// result.
    pub fn get_or_fetch(&self, key: FetchKey, fetch: impl FnOnce() -> NamedSeries) -> NamedSeries {
        if let Some(entry) = self.entries.borrow().get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                log::debug!("cache hit for {}/{}", key.source, key.identifier);
                return entry.series.clone();
            }
        }

        let series = fetch();
        self.entries.borrow_mut().insert(
            key,
            CacheEntry {
                series: series.clone(),
                fetched_at: Instant::now(),
            },
        );
        series
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
