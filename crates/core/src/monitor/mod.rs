//! The monitored-entity aggregate.
//!
//! [`Monitor`] owns everything that changes while the service runs: the
//! latest reading, the sample window, the thermal state, and the staleness
//! latch. It has exactly two mutators, [`Monitor::ingest`] (per sample) and
//! [`Monitor::tick`] (per watchdog timer tick); the caller serializes them.

pub mod config;
pub mod gate;
pub mod thermal;
pub mod watchdog;
pub mod window;

use serde::Serialize;

pub use config::MonitorConfig;
pub use gate::NotificationGate;
pub use thermal::{ThermalState, ThermalStateMachine};
pub use watchdog::StalenessWatchdog;
pub use window::{Sample, SampleWindow};

use crate::notification::Notification;
use crate::reading::Reading;
use crate::types::Timestamp;

/// Point-in-time view of a [`Monitor`], safe to hand out after the lock is
/// released.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub reading: Option<Reading>,
    pub thermal: ThermalState,
    pub window: Vec<Sample>,
    pub rate_per_sec: Option<f64>,
    pub last_sample_at: Timestamp,
    pub stale_alert_outstanding: bool,
}

#[derive(Debug, Clone)]
pub struct Monitor {
    config: MonitorConfig,
    current: Option<Reading>,
    window: SampleWindow,
    thermal: ThermalStateMachine,
    watchdog: StalenessWatchdog,
    last_sample_at: Timestamp,
}

impl Monitor {
    /// Start monitoring at `started_at`.
    ///
    /// The staleness clock starts at `started_at`, so a sensor that never
    /// reports is flagged one timeout after startup.
    pub fn new(config: MonitorConfig, started_at: Timestamp) -> Self {
        Self {
            config,
            current: None,
            window: SampleWindow::new(),
            thermal: ThermalStateMachine::new(),
            watchdog: StalenessWatchdog::new(),
            last_sample_at: started_at,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Accept a decoded reading and evaluate it at its observation time.
    pub fn ingest(&mut self, reading: Reading) -> Option<Notification> {
        let now = reading.observed_at;
        self.window.push(reading.temperature, now);
        self.current = Some(reading);
        self.last_sample_at = now;

        self.thermal
            .evaluate(&reading, &self.window, &self.config, now)
    }

    /// Run one staleness check at `now`.
    pub fn tick(&mut self, now: Timestamp) -> Option<Notification> {
        self.watchdog
            .check(self.last_sample_at, now, self.config.staleness_timeout)
    }

    pub fn state(&self) -> ThermalState {
        self.thermal.state()
    }

    pub fn current(&self) -> Option<&Reading> {
        self.current.as_ref()
    }

    pub fn last_sample_at(&self) -> Timestamp {
        self.last_sample_at
    }

    pub fn is_stale_alert_outstanding(&self) -> bool {
        self.watchdog.is_alert_outstanding()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            reading: self.current,
            thermal: self.thermal.state(),
            window: self.window.samples().copied().collect(),
            rate_per_sec: self.window.rate_of_change(),
            last_sample_at: self.last_sample_at,
            stale_alert_outstanding: self.watchdog.is_alert_outstanding(),
        }
    }
}
