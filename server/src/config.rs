//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use xrate_common::constants;
use xrate_rates::RateEngineConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_KEY must be set")]
    MissingApiKey,

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Main server configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub port: u16,
    /// exchangerate.host access key.
    pub api_key: String,
    /// Rate provider base URL.
    pub rate_api_base_url: String,
    /// Per-request provider timeout.
    pub rate_api_timeout: Duration,
    /// Latest-table refresh period.
    pub refresh_interval: Duration,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("listen_addr", &self.listen_addr)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("rate_api_base_url", &self.rate_api_base_url)
            .field("rate_api_timeout", &self.rate_api_timeout)
            .field("refresh_interval", &self.refresh_interval)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 8080,
            api_key: String::new(),
            rate_api_base_url: "https://api.exchangerate.host".to_string(),
            rate_api_timeout: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(constants::REFRESH_INTERVAL_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables, reading `.env` first
    /// when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("PORT") {
            config.port = parse_var("PORT", port)?;
        }

        if let Some(key) = lookup("API_KEY") {
            config.api_key = key.trim().to_string();
        }

        if let Some(url) = lookup("RATE_API_BASE_URL") {
            config.rate_api_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(secs) = lookup("RATE_API_TIMEOUT_SECS") {
            config.rate_api_timeout = Duration::from_secs(parse_var("RATE_API_TIMEOUT_SECS", secs)?);
        }

        if let Some(secs) = lookup("REFRESH_INTERVAL_SECS") {
            config.refresh_interval = Duration::from_secs(parse_var("REFRESH_INTERVAL_SECS", secs)?);
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid("Listen port cannot be 0".to_string()));
        }

        if !self.rate_api_base_url.starts_with("http://")
            && !self.rate_api_base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(
                "Rate API base URL must be http(s)".to_string(),
            ));
        }

        if self.rate_api_timeout.is_zero() {
            return Err(ConfigError::Invalid("Rate API timeout cannot be 0".to_string()));
        }

        self.engine_config().validate().map_err(ConfigError::Invalid)
    }

    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.listen_addr, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: "LISTEN_ADDR",
            value: raw,
        })
    }

    /// Engine configuration derived from this service configuration.
    pub fn engine_config(&self) -> RateEngineConfig {
        RateEngineConfig {
            refresh_interval: self.refresh_interval,
            ..RateEngineConfig::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}
