use std::sync::Arc;

use axum::routing::any;
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::guard::{authorize, Gate};

/// Build the gate router: `/auth` for any method.
pub fn build_router(gate: Arc<Gate>) -> Router {
    Router::new()
        .route("/auth", any(authorize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .with_state(gate)
}
