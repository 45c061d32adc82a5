//! Sensor dropout detection.

use chrono::Duration;

use super::gate::NotificationGate;
use crate::notification::Notification;
use crate::types::Timestamp;

/// Raises a single dropout alert when samples stop arriving.
///
/// Checked on an independent timer. Recovery is silent: once a fresh sample
/// is seen the gate is rearmed without notifying anyone.
#[derive(Debug, Clone, Default)]
pub struct StalenessWatchdog {
    gate: NotificationGate,
}

impl StalenessWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(
        &mut self,
        last_sample_at: Timestamp,
        now: Timestamp,
        timeout: Duration,
    ) -> Option<Notification> {
        if now - last_sample_at > timeout {
            self.gate.try_fire().then_some(Notification::DataStale {
                last_sample_at,
                timeout,
            })
        } else {
            self.gate.rearm();
            None
        }
    }

    pub fn is_alert_outstanding(&self) -> bool {
        self.gate.is_latched()
    }
}
