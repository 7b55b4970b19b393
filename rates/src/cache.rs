//! Concurrent store for the latest rate table and per-day historical tables.

use chrono::{Duration, NaiveDate};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use xrate_common::{format_date, now, RateTable, Timestamp};

/// The latest table together with the moment it was stored.
#[derive(Debug)]
struct LatestSnapshot {
    rates: RateTable,
    updated_at: Timestamp,
}

/// Thread-safe rate cache.
///
/// The latest slot is replaced wholesale: a new snapshot is built first and
/// swapped in under the write lock, so readers see either the old table or the
/// new one. Historical tables are keyed by calendar day. Every getter returns
/// an owned copy.
#[derive(Debug, Default)]
pub struct RateCache {
    latest: RwLock<Option<Arc<LatestSnapshot>>>,
    historical: DashMap<NaiveDate, RateTable>,
}

impl RateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the latest table, if one has been stored.
    pub fn get_latest(&self) -> Option<RateTable> {
        let snapshot = self.latest.read().clone();
        snapshot.map(|s| s.rates.clone())
    }

    /// Replace the latest table and stamp the current time.
    pub fn set_latest(&self, rates: RateTable) {
        let snapshot = Arc::new(LatestSnapshot {
            rates,
            updated_at: now(),
        });
        *self.latest.write() = Some(snapshot);
        debug!("Latest rates replaced");
    }

    /// When the latest table was last replaced. `None` before the first store.
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.latest.read().as_ref().map(|s| s.updated_at)
    }

    /// Get a copy of the table for `date`.
    pub fn get_historical(&self, date: NaiveDate) -> Option<RateTable> {
        let hit = self.historical.get(&date).map(|entry| entry.value().clone());
        debug!(
            date = %format_date(date),
            hit = hit.is_some(),
            "Historical cache lookup"
        );
        hit
    }

    /// Insert or overwrite the table for `date`.
    pub fn set_historical(&self, date: NaiveDate, rates: RateTable) {
        self.historical.insert(date, rates);
    }

    /// Insert the table for `date` unless one is already present, and return
    /// a copy of whichever table the cache holds afterwards.
    pub fn get_or_insert_historical(&self, date: NaiveDate, rates: RateTable) -> RateTable {
        self.historical.entry(date).or_insert(rates).value().clone()
    }

    /// Remove every historical table dated strictly before `cutoff`.
    ///
    /// Returns the number of entries removed. The latest table is untouched.
    pub fn evict_older_than(&self, cutoff: NaiveDate) -> usize {
        let mut removed = 0;
        self.historical.retain(|date, _| {
            let keep = *date >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            debug!(cutoff = %format_date(cutoff), removed, "Evicted historical rates");
        }
        removed
    }

    /// Number of cached historical days.
    pub fn historical_len(&self) -> usize {
        self.historical.len()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let last_updated = self.last_updated();
        let dates: Vec<NaiveDate> = self.historical.iter().map(|e| *e.key()).collect();

        CacheStats {
            has_latest: last_updated.is_some(),
            last_updated,
            latest_age_seconds: last_updated
                .map(|at| (now() - at).max(Duration::zero()).num_seconds()),
            historical_entries: dates.len(),
            oldest_historical: dates.iter().min().copied(),
            newest_historical: dates.iter().max().copied(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub has_latest: bool,
    pub last_updated: Option<Timestamp>,
    pub latest_age_seconds: Option<i64>,
    pub historical_entries: usize,
    pub oldest_historical: Option<NaiveDate>,
    pub newest_historical: Option<NaiveDate>,
}
