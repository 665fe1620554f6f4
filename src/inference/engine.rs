//! Prediction: model if loaded, heuristic fallback otherwise

use super::{InferenceError, ModelEntry};
use crate::models::{PredictionMethod, PredictionResult, TelemetryRecord, ThreatLabel};

/// Confidence reported by the fallback rule
pub const FALLBACK_CONFIDENCE: f64 = 85.5;

/// Highest attack severity the fallback still calls mitigated
pub const FALLBACK_SEVERITY_CUTOFF: f64 = 5.0;

/// `model_used` value when no model ran
pub const FALLBACK_MODEL_NAME: &str = "heuristic";

/// Predict with the entry's model, or with the fallback rule when absent
pub fn predict(record: &TelemetryRecord, entry: &ModelEntry) -> Result<PredictionResult, InferenceError> {
    let Some(model) = entry.handle.as_ref() else {
        return Ok(predict_fallback(record));
    };

    let features = model.preprocessor.transform(record)?;
    let output = model.classifier.classify(features.view())?;

    let label = ThreatLabel::from_class(output.class)
        .ok_or_else(|| InferenceError::Output(format!("label {} is not binary", output.class)))?;

    let confidence = output
        .probabilities
        .as_deref()
        .and_then(|p| p.iter().copied().filter(|v| v.is_finite()).reduce(f32::max))
        .map(|max| max as f64 * 100.0)
        .unwrap_or(100.0);

    Ok(PredictionResult::new(label, confidence, entry.name.clone(), PredictionMethod::Model))
}

/// Fallback heuristic prediction (no model).
///
/// Not real inference: severity <= 5 counts as mitigated, with a fixed
/// confidence.
pub fn predict_fallback(record: &TelemetryRecord) -> PredictionResult {
    let label = if record.attack_severity <= FALLBACK_SEVERITY_CUTOFF {
        ThreatLabel::Mitigated
    } else {
        ThreatLabel::Detected
    };

    PredictionResult::new(label, FALLBACK_CONFIDENCE, FALLBACK_MODEL_NAME, PredictionMethod::Fallback)
}
