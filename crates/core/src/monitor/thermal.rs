//! Idle / warming / ready classification.
//!
//! The current [`ThermalState`] doubles as the notification gate for the
//! thermal path: a notification is emitted only on the edge that enters
//! `Warming` or `Ready`, so repeated qualifying samples are no-ops until a
//! reset edge returns the machine to `Idle`.
//!
//! ```text
//! Idle ──(rate >= bound)──▶ Warming ──(temp >= ready)──▶ Ready
//! Idle ──(temp >= ready)──────────────────────────────▶ Ready
//! Warming ──(stall timeout, alert)──▶ Idle
//! Ready ──(temp < reset, silent)──▶ Idle
//! ```

use chrono::Duration;
use serde::Serialize;

use super::config::MonitorConfig;
use super::window::SampleWindow;
use crate::notification::Notification;
use crate::reading::Reading;
use crate::types::Timestamp;

/// Upper bound for the ready-time estimate (one week).
const MAX_ETA_SECS: f64 = 7.0 * 24.0 * 3600.0;

/// Operating state of the monitored sauna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ThermalState {
    #[default]
    Idle,
    Warming {
        started_at: Timestamp,
    },
    Ready,
}

impl ThermalState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Warming { .. } => "warming",
            Self::Ready => "ready",
        }
    }

    /// Whether the stove is considered switched on.
    pub fn is_heating(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Evaluates each new sample and decides which notification to emit.
#[derive(Debug, Clone, Default)]
pub struct ThermalStateMachine {
    state: ThermalState,
}

impl ThermalStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ThermalState {
        self.state
    }

    pub fn warming_started_at(&self) -> Option<Timestamp> {
        match self.state {
            ThermalState::Warming { started_at } => Some(started_at),
            _ => None,
        }
    }

    /// Evaluate `reading` (already pushed into `window`) at time `now`.
    ///
    /// Ready takes priority over warming. The stall timeout and the
    /// cool-down reset are checked on every call regardless of which branch
    /// ran; at most one notification is returned.
    pub fn evaluate(
        &mut self,
        reading: &Reading,
        window: &SampleWindow,
        config: &MonitorConfig,
        now: Timestamp,
    ) -> Option<Notification> {
        let temperature = reading.temperature;
        let mut notification = None;

        if temperature >= config.ready_threshold {
            if self.state != ThermalState::Ready {
                self.state = ThermalState::Ready;
                notification = Some(Notification::Ready { temperature });
            }
        } else if self.state == ThermalState::Idle {
            if let Some(rate) = window
                .warming_rate()
                .filter(|rate| *rate >= config.warming_rate_lower_bound)
            {
                let secs_remaining =
                    ((config.ready_threshold - temperature) / rate).clamp(0.0, MAX_ETA_SECS);
                self.state = ThermalState::Warming { started_at: now };
                notification = Some(Notification::Warming {
                    temperature,
                    rate_per_sec: rate,
                    estimated_ready_at: now + Duration::seconds(secs_remaining.round() as i64),
                });
            }
        }

        if let ThermalState::Warming { started_at } = self.state {
            if notification.is_none() && now - started_at > config.warming_timeout {
                self.state = ThermalState::Idle;
                notification = Some(Notification::WarmingStalled {
                    temperature,
                    warming_started_at: started_at,
                });
            }
        }

        if self.state == ThermalState::Ready && temperature < config.reset_threshold {
            self.state = ThermalState::Idle;
        }

        notification
    }
}
