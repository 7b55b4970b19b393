//! Main rate engine implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use xrate_common::{
    constants, retention_cutoff, Clock, RateTable, SupportedCurrencies, SystemClock,
};

use crate::cache::{CacheStats, RateCache};
use crate::conversion::{Conversion, Converter, RateSource, DISPLAY_SCALE};
use crate::error::RateResult;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::provider::RateProvider;
use crate::refresh::RefreshHandle;
use crate::validation::{ConversionRequest, Validator};

/// Configuration for the rate engine.
#[derive(Debug, Clone)]
pub struct RateEngineConfig {
    /// Currencies a request may name.
    pub supported: SupportedCurrencies,
    /// Historical lookback and cache retention, in days.
    pub retention_days: i64,
    /// Period of the latest-table refresh.
    pub refresh_interval: Duration,
    /// Fractional digits of converted amounts.
    pub display_scale: u32,
}

impl Default for RateEngineConfig {
    fn default() -> Self {
        Self {
            supported: SupportedCurrencies::default(),
            retention_days: constants::RETENTION_DAYS,
            refresh_interval: Duration::from_secs(constants::REFRESH_INTERVAL_SECS),
            display_scale: DISPLAY_SCALE,
        }
    }
}

impl RateEngineConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.supported.is_empty() {
            return Err("Supported currency set cannot be empty".to_string());
        }

        if self.retention_days < 0 {
            return Err("Retention days cannot be negative".to_string());
        }

        if self.refresh_interval.is_zero() {
            return Err("Refresh interval cannot be 0".to_string());
        }

        Ok(())
    }
}

/// The rate engine: validates requests, resolves rate tables through the
/// cache or the provider, converts, and keeps the latest table fresh.
pub struct RateEngine {
    provider: Arc<dyn RateProvider>,
    cache: RateCache,
    converter: Converter,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
    config: RateEngineConfig,
}

impl RateEngine {
    /// Create a new engine with the given provider.
    pub fn new(provider: Arc<dyn RateProvider>, config: RateEngineConfig) -> Self {
        Self::with_clock(provider, config, Arc::new(SystemClock))
    }

    /// Create a new engine reading "today" from `clock`.
    pub fn with_clock(
        provider: Arc<dyn RateProvider>,
        config: RateEngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache: RateCache::new(),
            converter: Converter::new(config.display_scale),
            clock,
            metrics: Metrics::new(),
            config,
        }
    }

    /// Load the latest table once, then schedule the periodic refresh.
    ///
    /// The refresh task is scheduled even when the initial load fails; the
    /// load outcome is returned alongside the task handle.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn start(self: &Arc<Self>) -> (RefreshHandle, RateResult<()>) {
        info!("Loading initial latest rates");

        let initial = self.refresh_once().await;
        if let Err(e) = &initial {
            error!(error = %e, "Initial rate load failed, refresh task will retry");
        }

        (RefreshHandle::spawn(self.clone()), initial)
    }

    /// Convert an amount and return the result with two fractional digits.
    pub async fn convert(
        &self,
        from: &str,
        to: &str,
        amount: &str,
        date: Option<NaiveDate>,
    ) -> RateResult<String> {
        self.convert_detailed(from, to, amount, date)
            .await
            .map(|conversion| conversion.result_string())
    }

    /// Convert an amount and return the full conversion record.
    #[instrument(skip(self))]
    pub async fn convert_detailed(
        &self,
        from: &str,
        to: &str,
        amount: &str,
        date: Option<NaiveDate>,
    ) -> RateResult<Conversion> {
        let request = match self.validator().validate(from, to, amount, date) {
            Ok(request) => request,
            Err(e) => {
                self.metrics.conversion_rejected();
                debug!(error = %e, "Conversion request rejected");
                return Err(e);
            }
        };

        match self.execute(request).await {
            Ok(conversion) => {
                self.metrics.conversion_success();
                info!(
                    conversion_id = %conversion.id,
                    result = %conversion.result,
                    "Conversion completed"
                );
                Ok(conversion)
            }
            Err(e) => {
                self.metrics.conversion_failed();
                warn!(
                    error = %e.detailed_message(),
                    code = e.error_code(),
                    "Conversion failed"
                );
                Err(e)
            }
        }
    }

    /// Get the latest table: cached copy, else a one-off provider fetch.
    ///
    /// An on-demand fetch is returned to the caller but never stored; the
    /// refresh path is the only writer of the latest slot.
    pub async fn latest_rates(&self) -> RateResult<RateTable> {
        if let Some(rates) = self.cache.get_latest() {
            self.metrics.latest_lookup(true);
            return Ok(rates);
        }

        self.metrics.latest_lookup(false);
        debug!("Latest rates not cached, fetching on demand");
        self.provider.fetch_latest().await.map_err(|e| {
            self.metrics.provider_error();
            warn!(provider = self.provider.name(), error = %e, "Failed to fetch latest rates");
            e
        })
    }

    /// Get the table for `date`: cached copy, else fetch and cache it.
    pub async fn historical_rates(&self, date: NaiveDate) -> RateResult<RateTable> {
        if let Some(rates) = self.cache.get_historical(date) {
            self.metrics.historical_lookup(true);
            return Ok(rates);
        }

        self.metrics.historical_lookup(false);
        let fetched = self.provider.fetch_historical(date).await.map_err(|e| {
            self.metrics.provider_error();
            warn!(
                provider = self.provider.name(),
                date = %date,
                error = %e,
                "Failed to fetch historical rates"
            );
            e
        })?;

        Ok(self.cache.get_or_insert_historical(date, fetched))
    }

    /// Run one refresh cycle: replace the latest table, then evict expired
    /// historical tables.
    ///
    /// A failed fetch leaves the previous latest table in place. Eviction runs
    /// either way. The fetch outcome is returned.
    #[instrument(skip(self))]
    pub async fn refresh_once(&self) -> RateResult<()> {
        let outcome = match self.provider.fetch_latest().await {
            Ok(rates) => {
                self.cache.set_latest(rates);
                self.metrics.refresh(true);
                info!("Latest rates refreshed");
                Ok(())
            }
            Err(e) => {
                self.metrics.refresh(false);
                self.metrics.provider_error();
                warn!(error = %e, "Latest rate refresh failed, keeping previous snapshot");
                Err(e)
            }
        };

        self.evict_expired();
        outcome
    }

    /// Drop historical tables older than the retention window.
    pub fn evict_expired(&self) -> usize {
        let cutoff = retention_cutoff(self.clock.today(), self.config.retention_days);
        let removed = self.cache.evict_older_than(cutoff);
        self.metrics.evicted(removed);
        removed
    }

    /// Get the rate cache.
    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &RateEngineConfig {
        &self.config
    }

    /// Get the rate provider name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Get engine statistics.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            provider: self.provider.name().to_string(),
            refresh_interval_secs: self.config.refresh_interval.as_secs(),
            retention_days: self.config.retention_days,
            cache: self.cache.stats(),
            metrics: self.metrics.snapshot(),
        }
    }

    fn validator(&self) -> Validator<'_> {
        Validator {
            supported: &self.config.supported,
            today: self.clock.today(),
            retention_days: self.config.retention_days,
        }
    }

    async fn execute(&self, request: ConversionRequest) -> RateResult<Conversion> {
        let (rates, source) = match request.date {
            None => (self.latest_rates().await?, RateSource::Latest),
            Some(date) => (
                self.historical_rates(date).await?,
                RateSource::Historical(date),
            ),
        };

        let result = self
            .converter
            .convert(&request.from, &request.to, request.amount, &rates)?;

        Ok(Conversion::new(
            request.from,
            request.to,
            request.amount,
            result,
            self.converter.scale(),
            source,
        ))
    }
}

/// Engine statistics.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub provider: String,
    pub refresh_interval_secs: u64,
    pub retention_days: i64,
    pub cache: CacheStats,
    pub metrics: MetricsSnapshot,
}
