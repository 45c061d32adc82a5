pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /receive-bt      POST  raw sensor payload
/// /status          GET   current monitor snapshot
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/receive-bt", post(handlers::ingest::receive_bt))
        .route("/status", get(handlers::status::get_status))
}
