use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use codelia_core::{Settings, SettingsUpdate};
use codelia_llm::ProviderKind;

use super::error::ApiError;
use super::AppState;

/// Current settings with every provider section present, so clients can
/// render empty forms. Keys are returned as stored; the server binds to
/// localhost.
pub async fn get_config(State(state): State<AppState>) -> Result<Json<Settings>, ApiError> {
    let mut settings = state
        .service
        .settings()
        .load()
        .map_err(ApiError::internal)?;

    for kind in ProviderKind::ALL {
        settings.section_mut(kind);
    }
    Ok(Json(settings))
}

pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .settings()
        .update(update)
        .map_err(|e| ApiError::internal(format!("Failed to save config: {}", e)))?;

    Ok(Json(json!({"status": "success", "message": "Configuration saved"})))
}
