//! Decoded sensor sample.

use serde::Serialize;

use crate::types::Timestamp;

/// One decoded sensor sample.
///
/// Produced by [`crate::ruuvi::decode`]; immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Battery voltage in millivolts.
    pub battery_mv: u16,
    /// When the sample was received.
    pub observed_at: Timestamp,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, battery_mv: u16, observed_at: Timestamp) -> Self {
        Self {
            temperature,
            humidity,
            battery_mv,
            observed_at,
        }
    }
}
