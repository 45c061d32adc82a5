//! Sensor payload ingestion.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use kiuas_core::ruuvi;

use crate::engine::IngestOutcome;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/receive-bt
///
/// The body is the raw RuuviTag manufacturer data (26 bytes with the company
/// id prefix, or the bare 24-byte frame). An undecodable payload is rejected
/// without touching the monitor.
pub async fn receive_bt(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<DataResponse<IngestOutcome>>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Request body is empty".into()));
    }

    let reading = ruuvi::decode(&body, Utc::now()).map_err(|e| {
        tracing::warn!(error = %e, len = body.len(), "Dropping undecodable sensor payload");
        AppError::Decode(e)
    })?;

    let outcome = state.engine.ingest(reading).await;
    Ok(Json(DataResponse { data: outcome }))
}
