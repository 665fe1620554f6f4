//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Per-request failures. Both variants are reported to the caller, never
/// treated as server faults.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed telemetry field
    #[error("{0}")]
    Validation(String),

    /// Preprocessing or classifier failure
    #[error("Prediction failed: {0}")]
    Inference(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(msg) => tracing::debug!("Rejected request: {}", msg),
            AppError::Inference(msg) => tracing::error!("Inference error: {}", msg),
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

impl From<crate::inference::InferenceError> for AppError {
    fn from(err: crate::inference::InferenceError) -> Self {
        AppError::Inference(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::Validation("Missing required field(s): IoT Layer".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required field(s): IoT Layer");
    }

    #[test]
    fn test_inference_message() {
        let err = AppError::Inference("label 7 is not binary".into());
        assert_eq!(err.to_string(), "Prediction failed: label 7 is not binary");
    }
}
