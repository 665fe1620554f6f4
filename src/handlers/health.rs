//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct ModelStatus {
    name: String,
    loaded: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    models_loaded: usize,
    fallback_active: bool,
    models: Vec<ModelStatus>,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let models: Vec<ModelStatus> = state
        .store
        .entries()
        .iter()
        .map(|e| ModelStatus { name: e.name.clone(), loaded: e.is_loaded() })
        .collect();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        models_loaded: state.store.loaded_count(),
        fallback_active: !state.store.primary().is_loaded(),
        models,
    })
}
