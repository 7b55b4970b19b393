//! xrate Rate Engine
//!
//! Exchange-rate engine: request validation, rate table caching, decimal
//! conversion and the scheduled refresh of the latest table.
//!
//! # Features
//!
//! - Atomic latest-table snapshot with a periodic refresh task
//! - Per-day historical tables, cached on first use and evicted after 90 days
//! - Half-up rounding to two fractional digits
//! - Pluggable rate providers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xrate_rates::{RateEngine, RateEngineConfig};
//!
//! let engine = Arc::new(RateEngine::new(provider, RateEngineConfig::default()));
//! let (refresh, initial) = engine.start().await;
//!
//! let result = engine.convert("USD", "INR", "100", None).await?;
//! assert_eq!(result, "8312.00");
//!
//! refresh.stop().await;
//! ```

pub mod cache;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod refresh;
pub mod validation;

pub use cache::{CacheStats, RateCache};
pub use conversion::{Conversion, Converter, RateSource, DISPLAY_SCALE};
pub use engine::{EngineStats, RateEngine, RateEngineConfig};
pub use error::{ConversionError, ErrorCategory, RateError, RateResult};
pub use metrics::{Metrics, MetricsSnapshot};
pub use provider::RateProvider;
pub use refresh::RefreshHandle;
pub use validation::{parse_amount, ConversionRequest, Validator};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
