//! Pure domain logic for the sauna monitor.
//!
//! Nothing in this crate performs I/O. The API crate feeds decoded readings
//! and wall-clock ticks into a [`monitor::Monitor`] and delivers whatever
//! [`notification::Notification`]s come back out.

pub mod error;
pub mod markdown;
pub mod monitor;
pub mod notification;
pub mod reading;
pub mod ruuvi;
pub mod types;
