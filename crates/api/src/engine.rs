//! The shared sauna engine.
//!
//! Two producers mutate the [`Monitor`]: the ingestion handler (one call per
//! sensor payload) and the watchdog task (one call per tick). Both go through
//! the same `tokio::sync::Mutex`, so every read-modify-write of the window,
//! thermal state and staleness latch is serialized.
//!
//! Notifications go out after the monitor lock is released, under a second
//! `delivery` lock that is acquired while the monitor lock is still held.
//! Sends therefore leave in the order their transitions happened, and a
//! slow send only holds up the next transition that also has something to
//! send. Delivery failures are logged and the state transition stands.

use std::sync::Arc;

use chrono::FixedOffset;
use kiuas_core::monitor::{Monitor, MonitorSnapshot, ThermalState};
use kiuas_core::notification::{Destination, Notification};
use kiuas_core::reading::Reading;
use kiuas_core::types::{ChatId, Timestamp};
use kiuas_events::Notifier;
use serde::Serialize;
use tokio::sync::Mutex;

/// Chat routing for outbound notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destinations {
    pub notification: ChatId,
    pub maintenance: ChatId,
}

impl Destinations {
    pub fn chat_for(&self, destination: Destination) -> ChatId {
        match destination {
            Destination::Notification => self.notification,
            Destination::Maintenance => self.maintenance,
        }
    }
}

/// Result of ingesting one reading.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub state: ThermalState,
    pub temperature: f64,
    /// Kind of the notification emitted for this reading, if any.
    pub notification: Option<&'static str>,
}

pub struct SaunaEngine {
    monitor: Mutex<Monitor>,
    delivery: Mutex<()>,
    notifier: Arc<dyn Notifier>,
    destinations: Destinations,
    display_offset: FixedOffset,
}

impl SaunaEngine {
    pub fn new(
        monitor: Monitor,
        notifier: Arc<dyn Notifier>,
        destinations: Destinations,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            monitor: Mutex::new(monitor),
            delivery: Mutex::new(()),
            notifier,
            destinations,
            display_offset,
        }
    }

    pub fn destinations(&self) -> Destinations {
        self.destinations
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Feed one decoded reading through the state machine.
    pub async fn ingest(&self, reading: Reading) -> IngestOutcome {
        let (notification, state, delivery) = {
            let mut monitor = self.monitor.lock().await;
            let previous = monitor.state();
            let notification = monitor.ingest(reading);
            let state = monitor.state();
            if state.label() != previous.label() {
                tracing::info!(
                    from = previous.label(),
                    to = state.label(),
                    temperature = reading.temperature,
                    "Thermal state changed"
                );
            }
            let delivery = match notification {
                Some(_) => Some(self.delivery.lock().await),
                None => None,
            };
            (notification, state, delivery)
        };

        tracing::debug!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            battery_mv = reading.battery_mv,
            state = state.label(),
            "Reading ingested"
        );

        if let Some(notification) = &notification {
            self.dispatch(notification).await;
        }
        drop(delivery);

        IngestOutcome {
            state,
            temperature: reading.temperature,
            notification: notification.as_ref().map(Notification::kind),
        }
    }

    /// Run one staleness check at `now`.
    pub async fn watchdog_tick(&self, now: Timestamp) -> Option<Notification> {
        let (notification, delivery) = {
            let mut monitor = self.monitor.lock().await;
            let was_outstanding = monitor.is_stale_alert_outstanding();
            let notification = monitor.tick(now);
            if was_outstanding && !monitor.is_stale_alert_outstanding() {
                tracing::info!(
                    last_sample_at = %monitor.last_sample_at(),
                    "Sensor data resumed"
                );
            }
            let delivery = match notification {
                Some(_) => Some(self.delivery.lock().await),
                None => None,
            };
            (notification, delivery)
        };

        if let Some(notification) = &notification {
            tracing::warn!(%notification, "Sensor data is stale");
            self.dispatch(notification).await;
        }
        drop(delivery);
        notification
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        self.monitor.lock().await.snapshot()
    }

    /// Render and send a notification. Failures are logged, never retried.
    async fn dispatch(&self, notification: &Notification) {
        let chat_id = self.destinations.chat_for(notification.destination());
        let text = notification.render(&self.display_offset);

        match self.notifier.send(chat_id, &text).await {
            Ok(()) => tracing::info!(
                kind = notification.kind(),
                chat_id,
                %notification,
                "Notification sent"
            ),
            Err(e) => tracing::error!(
                kind = notification.kind(),
                chat_id,
                error = %e,
                "Failed to deliver notification"
            ),
        }
    }
}
