//! ONNX Runtime classifier
//!
//! Load ONNX graph exported từ sklearn (zipmap tắt).
//! Label output đọc dạng i64, probability output dạng f32 `1 × classes`.

use std::path::Path;

use ndarray::ArrayView2;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::{Tensor, ValueType};
use parking_lot::Mutex;

use super::{ClassOutput, Classifier, InferenceError};

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    label_output: Option<String>,
    probability_output: Option<String>,
    /// Fixed feature width of the first input; None when dynamic
    input_width: Option<usize>,
}

impl OnnxClassifier {
    /// Load ONNX model từ file
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        tracing::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError::NotFound(model_path.display().to_string()));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Runtime(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::Runtime(format!("Failed to load model: {}", e)))?;

        let input_width = session
            .inputs
            .first()
            .and_then(|input| match &input.input_type {
                ValueType::Tensor { shape, .. } => shape.last().copied(),
                _ => None,
            })
            .filter(|&width| width > 0)
            .map(|width| width as usize);

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let (label_output, probability_output) = pick_outputs(&output_names);

        if label_output.is_none() && probability_output.is_none() {
            return Err(InferenceError::Output("model defines no outputs".into()));
        }

        tracing::debug!(
            input_width = ?input_width,
            label = ?label_output,
            probabilities = ?probability_output,
            "ONNX outputs resolved"
        );

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            probability_output,
            input_width,
        })
    }

    /// Feature count the graph expects, when the export fixed it
    pub fn input_width(&self) -> Option<usize> {
        self.input_width
    }
}

/// Pick the label and probability outputs by name.
///
/// Label: first name containing "label", else the first output that is not
/// the probability output. Probabilities: first name containing "prob".
pub fn pick_outputs(names: &[String]) -> (Option<String>, Option<String>) {
    let probability = names
        .iter()
        .find(|n| n.to_lowercase().contains("prob"))
        .cloned();

    let label = names
        .iter()
        .find(|n| n.to_lowercase().contains("label"))
        .or_else(|| names.iter().find(|n| Some(*n) != probability.as_ref()))
        .cloned();

    (label, probability)
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: ArrayView2<'_, f32>) -> Result<ClassOutput, InferenceError> {
        let input_tensor = Tensor::from_array(features.to_owned())
            .map_err(|e| InferenceError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(format!("Inference failed: {}", e)))?;

        let probabilities = match &self.probability_output {
            Some(name) => match outputs.get(name.as_str()) {
                Some(output) => match output.try_extract_tensor::<f32>() {
                    Ok((_, data)) => Some(data.to_vec()),
                    Err(e) => {
                        tracing::debug!("Probability output unreadable ({}), ignoring", e);
                        None
                    }
                },
                None => None,
            },
            None => None,
        };

        let class = match &self.label_output {
            Some(name) => {
                let output = outputs
                    .get(name.as_str())
                    .ok_or_else(|| InferenceError::Output(format!("missing output '{}'", name)))?;
                let (_, data) = output
                    .try_extract_tensor::<i64>()
                    .map_err(|e| InferenceError::Output(format!("Extract error: {}", e)))?;
                *data
                    .first()
                    .ok_or_else(|| InferenceError::Output("empty label tensor".into()))?
            }
            None => probabilities
                .as_deref()
                .and_then(argmax)
                .ok_or_else(|| InferenceError::Output("no label and no probabilities".into()))?
                as i64,
        };

        Ok(ClassOutput { class, probabilities })
    }
}

/// Index of the largest value
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}
