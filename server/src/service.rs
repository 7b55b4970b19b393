//! Service lifecycle around the rate engine.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, instrument};
use xrate_rates::{RateEngine, RateResult, RefreshHandle};

use crate::state::ServiceState;

/// The conversion service: owns the engine, its refresh task and the
/// lifecycle state reported by `/health`.
pub struct RateService {
    engine: Arc<RateEngine>,
    state: RwLock<ServiceState>,
    refresh: Mutex<Option<RefreshHandle>>,
}

impl RateService {
    /// Create a new service in the `Starting` state.
    pub fn new(engine: Arc<RateEngine>) -> Self {
        Self {
            engine,
            state: RwLock::new(ServiceState::Starting),
            refresh: Mutex::new(None),
        }
    }

    /// Load the initial latest table, schedule refreshes and start accepting
    /// requests.
    ///
    /// The service runs even when the initial load fails; conversions then
    /// fall back to on-demand fetches until the first successful refresh.
    #[instrument(skip(self))]
    pub async fn start(&self) -> RateResult<()> {
        info!(provider = self.engine.provider_name(), "Starting rate service");

        let (handle, initial) = self.engine.start().await;
        let previous = self.refresh.lock().replace(handle);
        if let Some(previous) = previous {
            previous.stop().await;
        }

        *self.state.write() = ServiceState::Running;

        info!("Rate service started");
        initial
    }

    /// Stop accepting requests. Called when a shutdown signal arrives.
    pub fn begin_shutdown(&self) {
        let mut state = self.state.write();
        if !state.is_terminal() {
            *state = ServiceState::ShuttingDown;
        }
    }

    /// Stop the refresh task and mark the service stopped.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        info!("Stopping rate service");
        self.begin_shutdown();

        let handle = self.refresh.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }

        *self.state.write() = ServiceState::Stopped;
        info!("Rate service stopped");
    }

    /// Get current service state.
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Check if service is accepting requests.
    pub fn is_accepting_requests(&self) -> bool {
        self.state().is_operational()
    }

    pub fn engine(&self) -> &Arc<RateEngine> {
        &self.engine
    }
}
