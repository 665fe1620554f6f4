//! Inference Module - model store, preprocessing and prediction
//!
//! Tách logic inference khỏi HTTP handlers.
//! Classifier nằm sau trait để dễ swap runtime.

pub mod preprocessor;
pub mod onnx;
pub mod store;
pub mod engine;

use ndarray::ArrayView2;

use crate::models::{FieldBag, PredictionResult, TelemetryRecord};
use crate::AppResult;

pub use preprocessor::Preprocessor;
pub use onnx::OnnxClassifier;
pub use store::{LoadedModel, ModelEntry, ModelStore};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid preprocessor artifact: {0}")]
    InvalidArtifact(String),

    #[error("ONNX runtime error: {0}")]
    Runtime(String),

    #[error("unexpected model output: {0}")]
    Output(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Raw classifier output for a single row
#[derive(Debug, Clone, PartialEq)]
pub struct ClassOutput {
    pub class: i64,
    /// Class posteriors, when the model exposes them
    pub probabilities: Option<Vec<f32>>,
}

/// Trait cho classifier backends (ONNX, stub trong tests...)
pub trait Classifier: Send + Sync {
    fn classify(&self, features: ArrayView2<'_, f32>) -> Result<ClassOutput, InferenceError>;
}

/// Full request flow: adapt the bag, resolve the model, predict
pub fn analyze(store: &ModelStore, bag: &FieldBag) -> AppResult<PredictionResult> {
    let record = TelemetryRecord::adapt(bag)?;
    let entry = store.lookup(bag.model_type());
    let result = engine::predict(&record, entry)?;

    tracing::debug!(
        requested = bag.model_type().unwrap_or("-"),
        model = %result.model_used,
        label = result.label.as_u8(),
        confidence = result.confidence,
        "Prediction complete"
    );

    Ok(result)
}
