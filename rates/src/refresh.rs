//! Periodic refresh of the latest rate table.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use xrate_common::constants;

use crate::engine::RateEngine;

/// Handle to the background refresh task.
///
/// Dropping the handle also stops the task, at its next wake-up.
#[derive(Debug)]
pub struct RefreshHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Spawn the refresh loop. The first tick fires one interval from now.
    pub fn spawn(engine: Arc<RateEngine>) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(run_refresh_loop(engine, shutdown_rx));
        Self { shutdown_tx, task }
    }

    /// Stop the task and wait for it to exit. An in-flight refresh completes
    /// first.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            error!(error = %e, "Refresh task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run_refresh_loop(engine: Arc<RateEngine>, mut shutdown_rx: mpsc::Receiver<()>) {
    let mut period = engine.config().refresh_interval;
    if period.is_zero() {
        error!("Refresh interval is zero, falling back to the default");
        period = Duration::from_secs(constants::REFRESH_INTERVAL_SECS);
    }
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = period.as_secs(), "Rate refresh task started");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                // A panicking cycle must not take the schedule down with it.
                let cycle = engine.clone();
                match tokio::spawn(async move { cycle.refresh_once().await }).await {
                    Ok(Ok(())) => debug!("Scheduled refresh completed"),
                    // Already logged by the engine.
                    Ok(Err(_)) => {}
                    Err(e) => error!(error = %e, "Scheduled refresh panicked"),
                }
            }
        }
    }

    info!("Rate refresh task stopped");
}
