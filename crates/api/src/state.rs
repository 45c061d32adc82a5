use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::engine::SaunaEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    /// The monitor aggregate and its delivery channel.
    pub engine: Arc<SaunaEngine>,
}
