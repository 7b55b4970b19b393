//! xrate Server
//!
//! HTTP front end for the rate engine: configuration, the exchangerate.host
//! provider client, axum handlers and the service lifecycle.

pub mod client;
pub mod config;
pub mod handler;
pub mod service;
pub mod state;

pub use client::ExchangeRateHostProvider;
pub use config::{ConfigError, ServiceConfig};
pub use handler::router;
pub use service::RateService;
pub use state::ServiceState;
