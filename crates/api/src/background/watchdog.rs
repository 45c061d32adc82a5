//! Periodic sensor staleness check.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::SaunaEngine;

/// Run the staleness watchdog until `cancel` is triggered.
pub async fn run(engine: Arc<SaunaEngine>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Staleness watchdog started");

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Staleness watchdog stopping");
                break;
            }
            _ = interval.tick() => {
                engine.watchdog_tick(Utc::now()).await;
            }
        }
    }
}
