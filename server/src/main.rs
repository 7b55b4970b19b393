//! xrate Server Binary
//!
//! Serves currency conversions over HTTP using exchangerate.host rates.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xrate_rates::RateEngine;
use xrate_server::{router, ExchangeRateHostProvider, RateService, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServiceConfig::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting xrate server");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let engine_config = config.engine_config();
    let provider = ExchangeRateHostProvider::new(
        config.rate_api_base_url.clone(),
        config.api_key.clone(),
        config.rate_api_timeout,
        engine_config.supported.clone(),
    )
    .context("Failed to build rate provider client")?;

    let engine = Arc::new(RateEngine::new(Arc::new(provider), engine_config));
    let service = Arc::new(RateService::new(engine));

    if let Err(e) = service.start().await {
        warn!(error = %e, "Serving without cached latest rates until the next refresh");
    }

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        listen_addr = %addr,
        refresh_interval_secs = config.refresh_interval.as_secs(),
        "xrate server running"
    );

    axum::serve(listener, router(service.clone()))
        .with_graceful_shutdown(shutdown_signal(service.clone()))
        .await
        .context("Server error")?;

    service.stop().await;

    info!("xrate server shutdown complete");
    Ok(())
}

async fn shutdown_signal(service: Arc<RateService>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
    service.begin_shutdown();
}
