use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use codelia_db::{HistoryRecord, SaveRequest};
use codelia_logging::LogEvent;

use super::error::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: i64,
}

pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let records = state.db.history().list().map_err(ApiError::internal)?;
    Ok(Json(records))
}

pub async fn save_history(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<Value>, ApiError> {
    let saved = state
        .db
        .history()
        .save_session(&request)
        .map_err(ApiError::internal)?;

    state.logger.log(&LogEvent::HistorySaved {
        session_id: saved.session_id.clone(),
        records: saved.ids.len(),
    });

    Ok(Json(json!({
        "status": "success",
        "message": "History saved",
        "session_id": saved.session_id,
        "ids": saved.ids,
        "req_ids": saved.req_ids,
    })))
}

pub async fn delete_history(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .db
        .history()
        .delete(request.id)
        .map_err(ApiError::internal)?;

    Ok(Json(json!({"status": "success", "deleted": deleted})))
}
