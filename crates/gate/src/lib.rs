//! Replay-protection gate for the sensor ingestion endpoint.
//!
//! Runs as a reverse-proxy ForwardAuth target: the proxy calls `/auth` with
//! the original request's headers and only forwards the request on a 2xx.
//! A request passes when it carries the shared API key, a fresh Unix
//! `Timestamp`, and a `Nonce` that has not been seen inside the window.

pub mod config;
pub mod guard;
pub mod nonce;
pub mod router;

pub use guard::{ApiKey, Gate, GateError};
pub use nonce::NonceStore;
