use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;

use codelia_core::ImproveOutcome;
use codelia_scoring::{Evaluation, PatternData};

use super::error::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pattern_data: PatternData,
}

pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<Evaluation>, ApiError> {
    let text = request.text.unwrap_or_default();
    let evaluation = state.service.evaluate(&text).await?;
    Ok(Json(evaluation))
}

pub async fn improve(
    State(state): State<AppState>,
    Json(request): Json<ImproveRequest>,
) -> Result<Json<ImproveOutcome>, ApiError> {
    let text = request.text.unwrap_or_default();
    let outcome = state.service.improve(&text, &request.pattern_data).await?;
    Ok(Json(outcome))
}
