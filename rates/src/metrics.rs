//! Counters for engine monitoring.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Engine metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Conversions that produced a result.
    pub conversions_success: AtomicU64,
    /// Requests rejected by validation.
    pub conversions_rejected: AtomicU64,
    /// Requests that failed after validation.
    pub conversions_failed: AtomicU64,
    /// Latest lookups served from the cache.
    pub latest_cache_hits: AtomicU64,
    /// Latest lookups that fell back to the provider.
    pub latest_cache_misses: AtomicU64,
    /// Historical lookups served from the cache.
    pub historical_cache_hits: AtomicU64,
    /// Historical lookups fetched from the provider.
    pub historical_cache_misses: AtomicU64,
    /// Provider fetches that failed.
    pub provider_errors: AtomicU64,
    /// Scheduled refreshes that stored a new table.
    pub refreshes_success: AtomicU64,
    /// Scheduled refreshes whose fetch failed.
    pub refreshes_failed: AtomicU64,
    /// Historical entries removed by eviction.
    pub historical_evicted: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversion_success(&self) {
        self.conversions_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn conversion_rejected(&self) {
        self.conversions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn conversion_failed(&self) {
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a latest-table lookup.
    pub fn latest_lookup(&self, hit: bool) {
        let counter = if hit {
            &self.latest_cache_hits
        } else {
            &self.latest_cache_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a historical-table lookup.
    pub fn historical_lookup(&self, hit: bool) {
        let counter = if hit {
            &self.historical_cache_hits
        } else {
            &self.historical_cache_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn provider_error(&self) {
        self.provider_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a scheduled refresh.
    pub fn refresh(&self, success: bool) {
        let counter = if success {
            &self.refreshes_success
        } else {
            &self.refreshes_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evicted(&self, count: usize) {
        self.historical_evicted.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            conversions_success: self.conversions_success.load(Ordering::Relaxed),
            conversions_rejected: self.conversions_rejected.load(Ordering::Relaxed),
            conversions_failed: self.conversions_failed.load(Ordering::Relaxed),
            latest_cache_hits: self.latest_cache_hits.load(Ordering::Relaxed),
            latest_cache_misses: self.latest_cache_misses.load(Ordering::Relaxed),
            historical_cache_hits: self.historical_cache_hits.load(Ordering::Relaxed),
            historical_cache_misses: self.historical_cache_misses.load(Ordering::Relaxed),
            provider_errors: self.provider_errors.load(Ordering::Relaxed),
            refreshes_success: self.refreshes_success.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            historical_evicted: self.historical_evicted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub conversions_success: u64,
    pub conversions_rejected: u64,
    pub conversions_failed: u64,
    pub latest_cache_hits: u64,
    pub latest_cache_misses: u64,
    pub historical_cache_hits: u64,
    pub historical_cache_misses: u64,
    pub provider_errors: u64,
    pub refreshes_success: u64,
    pub refreshes_failed: u64,
    pub historical_evicted: u64,
}
