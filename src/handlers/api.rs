//! JSON prediction API

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::inference;
use crate::models::FieldBag;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: u8,
    pub confidence: f64,
    pub status: &'static str,
    pub model_used: String,
}

/// POST /api/predict
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(body) = body.map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e.body_text())))?;

    let object = body
        .as_object()
        .ok_or_else(|| AppError::Validation("Request body must be a JSON object".to_string()))?;

    let bag = FieldBag::from_json(object);
    let result = inference::analyze(&state.store, &bag)?;

    Ok(Json(PredictResponse {
        success: true,
        prediction: result.label.as_u8(),
        confidence: result.confidence,
        status: result.verdict().status,
        model_used: result.model_used,
    }))
}
