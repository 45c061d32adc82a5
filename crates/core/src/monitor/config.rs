//! Monitor thresholds.

use chrono::Duration;

use crate::error::CoreError;

/// Default ready threshold in °C.
pub const DEFAULT_READY_THRESHOLD: f64 = 70.0;

/// Default minimum warming rate in °C per second.
pub const DEFAULT_WARMING_RATE_LOWER_BOUND: f64 = 0.0123;

/// Default cool-down threshold in °C.
pub const DEFAULT_RESET_THRESHOLD: f64 = 40.0;

/// Default time a warming cycle may take before it is reported as stalled.
pub const DEFAULT_WARMING_TIMEOUT_SECS: i64 = 2 * 3600;

/// Default silence after which the sensor is considered dropped out.
pub const DEFAULT_STALENESS_TIMEOUT_SECS: i64 = 3600;

/// Immutable thresholds supplied at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Temperature (inclusive) at which the sauna counts as ready.
    pub ready_threshold: f64,
    /// Minimum rate of change (inclusive, °C/s) that counts as warming.
    pub warming_rate_lower_bound: f64,
    /// Temperature below which a finished cycle is rearmed.
    pub reset_threshold: f64,
    pub warming_timeout: Duration,
    pub staleness_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ready_threshold: DEFAULT_READY_THRESHOLD,
            warming_rate_lower_bound: DEFAULT_WARMING_RATE_LOWER_BOUND,
            reset_threshold: DEFAULT_RESET_THRESHOLD,
            warming_timeout: Duration::seconds(DEFAULT_WARMING_TIMEOUT_SECS),
            staleness_timeout: Duration::seconds(DEFAULT_STALENESS_TIMEOUT_SECS),
        }
    }
}

impl MonitorConfig {
    /// Reject threshold combinations the state machine cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("ready_threshold", self.ready_threshold),
            ("warming_rate_lower_bound", self.warming_rate_lower_bound),
            ("reset_threshold", self.reset_threshold),
        ] {
            if !value.is_finite() {
                return Err(CoreError::Validation(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }

        if self.warming_rate_lower_bound <= 0.0 {
            return Err(CoreError::Validation(format!(
                "warming_rate_lower_bound must be positive, got {}",
                self.warming_rate_lower_bound
            )));
        }

        if self.reset_threshold >= self.ready_threshold {
            return Err(CoreError::Validation(format!(
                "reset_threshold ({}) must be below ready_threshold ({})",
                self.reset_threshold, self.ready_threshold
            )));
        }

        for (name, timeout) in [
            ("warming_timeout", self.warming_timeout),
            ("staleness_timeout", self.staleness_timeout),
        ] {
            if timeout <= Duration::zero() {
                return Err(CoreError::Validation(format!(
                    "{name} must be positive"
                )));
            }
        }

        Ok(())
    }
}
