use axum::extract::State;
use axum::Json;
use kiuas_core::monitor::MonitorSnapshot;

use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<DataResponse<MonitorSnapshot>> {
    Json(DataResponse {
        data: state.engine.snapshot().await,
    })
}
