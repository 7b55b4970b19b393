//! Rate provider trait and test double.

use async_trait::async_trait;
use chrono::NaiveDate;
use xrate_common::RateTable;

use crate::error::RateResult;

/// Source of full rate tables.
///
/// Implementations return a table anchored to one base currency that covers
/// at least the supported currencies, or an upstream [`RateError`].
///
/// [`RateError`]: crate::error::RateError
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current table.
    async fn fetch_latest(&self) -> RateResult<RateTable>;

    /// Fetch the table as of a calendar day.
    async fn fetch_historical(&self, date: NaiveDate) -> RateResult<RateTable>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockRateProvider;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::RateError;
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory provider with call counters and switchable failure.
    pub struct MockRateProvider {
        name: String,
        latest: Mutex<Option<RateTable>>,
        historical: DashMap<NaiveDate, RateTable>,
        failing: AtomicBool,
        delay: Mutex<Option<Duration>>,
        latest_calls: AtomicUsize,
        historical_calls: AtomicUsize,
    }

    impl MockRateProvider {
        /// Create a new mock provider with no tables.
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                latest: Mutex::new(None),
                historical: DashMap::new(),
                failing: AtomicBool::new(false),
                delay: Mutex::new(None),
                latest_calls: AtomicUsize::new(0),
                historical_calls: AtomicUsize::new(0),
            }
        }

        /// Set the table returned by `fetch_latest`.
        pub fn set_latest(&self, rates: RateTable) {
            *self.latest.lock() = Some(rates);
        }

        /// Set the table returned by `fetch_historical(date)`.
        pub fn set_historical(&self, date: NaiveDate, rates: RateTable) {
            self.historical.insert(date, rates);
        }

        /// Make every fetch fail with `FetchFailed`.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Delay every fetch, to widen race windows in tests.
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }

        pub fn latest_calls(&self) -> usize {
            self.latest_calls.load(Ordering::SeqCst)
        }

        pub fn historical_calls(&self) -> usize {
            self.historical_calls.load(Ordering::SeqCst)
        }

        async fn before_fetch(&self) -> RateResult<()> {
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(RateError::FetchFailed("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_latest(&self) -> RateResult<RateTable> {
            self.latest_calls.fetch_add(1, Ordering::SeqCst);
            self.before_fetch().await?;
            self.latest
                .lock()
                .clone()
                .ok_or_else(|| RateError::ProviderFailure("no latest rates".to_string()))
        }

        async fn fetch_historical(&self, date: NaiveDate) -> RateResult<RateTable> {
            self.historical_calls.fetch_add(1, Ordering::SeqCst);
            self.before_fetch().await?;
            self.historical
                .get(&date)
                .map(|r| r.value().clone())
                .ok_or_else(|| RateError::ProviderFailure(format!("no rates for {date}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RateError;
    use rust_decimal_macros::dec;
    use xrate_common::CurrencyCode;

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockRateProvider::new("test");
        let table = RateTable::from_rates(CurrencyCode::usd(), [("EUR", dec!(0.92))]);
        let date = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        provider.set_latest(table.clone());
        provider.set_historical(date, table.clone());

        assert_eq!(provider.fetch_latest().await.unwrap(), table);
        assert_eq!(provider.fetch_historical(date).await.unwrap(), table);
        assert_eq!(provider.latest_calls(), 1);
        assert_eq!(provider.historical_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_failure() {
        let provider = MockRateProvider::new("test");
        provider.set_latest(RateTable::new(CurrencyCode::usd()));
        provider.set_failing(true);

        let result = provider.fetch_latest().await;

        assert!(matches!(result, Err(RateError::FetchFailed(_))));
    }
}
