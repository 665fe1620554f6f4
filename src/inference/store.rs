//! Model store - named (preprocessor, classifier) pairs loaded at startup

use std::path::Path;
use std::sync::Arc;

use super::{Classifier, InferenceError, OnnxClassifier, Preprocessor};
use crate::config::Config;

/// Shared preprocessor filename, used when a model has no own artifact
pub const SHARED_PREPROCESSOR: &str = "preprocessor.json";

/// A classifier together with the preprocessor it was trained behind
pub struct LoadedModel {
    pub classifier: Box<dyn Classifier>,
    pub preprocessor: Arc<Preprocessor>,
}

/// One configured model; `handle` is None when its artifacts are missing
pub struct ModelEntry {
    pub name: String,
    pub handle: Option<LoadedModel>,
}

impl ModelEntry {
    pub fn absent(name: impl Into<String>) -> Self {
        Self { name: name.into(), handle: None }
    }

    pub fn loaded(name: impl Into<String>, classifier: Box<dyn Classifier>, preprocessor: Arc<Preprocessor>) -> Self {
        Self {
            name: name.into(),
            handle: Some(LoadedModel { classifier, preprocessor }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// "random_forest" -> "Random Forest"
    pub fn display_name(&self) -> String {
        self.name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| match w {
                "svm" => "SVM".to_string(),
                _ => {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read-only after construction
pub struct ModelStore {
    entries: Vec<ModelEntry>,
    primary: usize,
}

impl ModelStore {
    /// Load every configured model from `config.models_dir`.
    ///
    /// Missing or corrupt artifacts are logged and leave the entry absent.
    pub fn load(config: &Config) -> Self {
        let dir = config.models_dir.as_path();
        tracing::info!("Loading models from {}", dir.display());

        let shared = match Preprocessor::from_file(&dir.join(SHARED_PREPROCESSOR)) {
            Ok(pre) => Some(Arc::new(pre)),
            Err(InferenceError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!("Shared preprocessor unusable: {}", e);
                None
            }
        };

        let entries = config
            .model_names
            .iter()
            .map(|name| match load_model(dir, name, shared.as_ref()) {
                Ok(handle) => {
                    tracing::info!(
                        model = %name,
                        features = handle.preprocessor.feature_count(),
                        "Model loaded successfully"
                    );
                    ModelEntry { name: name.clone(), handle: Some(handle) }
                }
                Err(e) => {
                    tracing::warn!(model = %name, error = %e, "Model unavailable, skipping");
                    ModelEntry::absent(name.clone())
                }
            })
            .collect();

        let store = Self::from_entries(entries, &config.primary_model);
        tracing::info!(
            "Loaded {}/{} models, primary: {}",
            store.loaded_count(),
            store.entries.len(),
            store.primary().name
        );
        store
    }

    /// Build from prepared entries; an absent primary entry is appended
    /// when `primary` is not among them.
    pub fn from_entries(mut entries: Vec<ModelEntry>, primary: &str) -> Self {
        let primary = match entries.iter().position(|e| e.name == primary) {
            Some(index) => index,
            None => {
                entries.push(ModelEntry::absent(primary));
                entries.len() - 1
            }
        };
        Self { entries, primary }
    }

    /// Named entry when known and loaded, otherwise the primary entry
    pub fn lookup(&self, name: Option<&str>) -> &ModelEntry {
        name.and_then(|n| self.entries.iter().find(|e| e.name == n && e.is_loaded()))
            .unwrap_or_else(|| self.primary())
    }

    pub fn primary(&self) -> &ModelEntry {
        &self.entries[self.primary]
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn loaded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_loaded()).count()
    }

    /// Known categories for a form field, from the first loaded preprocessor
    pub fn category_options(&self, column: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.handle.as_ref())
            .map(|h| h.preprocessor.categories(column))
            .find(|c| !c.is_empty())
            .map(|c| c.to_vec())
            .unwrap_or_default()
    }
}

/// Preprocessor first (own, then shared), classifier last
fn load_model(dir: &Path, name: &str, shared: Option<&Arc<Preprocessor>>) -> Result<LoadedModel, InferenceError> {
    let own_path = dir.join(format!("{}_preprocessor.json", name));
    let preprocessor = match Preprocessor::from_file(&own_path) {
        Ok(pre) => Arc::new(pre),
        Err(InferenceError::NotFound(_)) => shared
            .cloned()
            .ok_or_else(|| InferenceError::NotFound(format!("no preprocessor for '{}'", name)))?,
        Err(e) => return Err(e),
    };

    let classifier = OnnxClassifier::load(&dir.join(format!("{}_model.onnx", name)))?;

    if let Some(width) = classifier.input_width() {
        if width != preprocessor.feature_count() {
            return Err(InferenceError::InvalidArtifact(format!(
                "'{}' expects {} features, preprocessor produces {}",
                name,
                width,
                preprocessor.feature_count()
            )));
        }
    }

    Ok(LoadedModel {
        classifier: Box::new(classifier),
        preprocessor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::preprocessor::tests::SAMPLE_JSON;
    use crate::inference::ClassOutput;
    use ndarray::ArrayView2;

    struct Fixed(i64);

    impl Classifier for Fixed {
        fn classify(&self, _: ArrayView2<'_, f32>) -> Result<ClassOutput, InferenceError> {
            Ok(ClassOutput { class: self.0, probabilities: None })
        }
    }

    fn preprocessor() -> Arc<Preprocessor> {
        Arc::new(Preprocessor::from_json(SAMPLE_JSON).unwrap())
    }

    fn config_for(dir: &Path) -> Config {
        let dir = dir.display().to_string();
        Config::from_lookup(|key| match key {
            "MODELS_DIR" => Some(dir.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_lookup_defaults_to_primary() {
        let store = ModelStore::from_entries(
            vec![
                ModelEntry::loaded("random_forest", Box::new(Fixed(1)), preprocessor()),
                ModelEntry::loaded("svm", Box::new(Fixed(0)), preprocessor()),
                ModelEntry::absent("decision_tree"),
            ],
            "random_forest",
        );

        assert_eq!(store.lookup(Some("svm")).name, "svm");
        assert_eq!(store.lookup(None).name, "random_forest");
        assert_eq!(store.lookup(Some("xgboost")).name, "random_forest");
        // known but absent falls back too
        assert_eq!(store.lookup(Some("decision_tree")).name, "random_forest");
        assert_eq!(store.loaded_count(), 2);
    }

    #[test]
    fn test_missing_primary_is_appended() {
        let store = ModelStore::from_entries(vec![ModelEntry::absent("svm")], "random_forest");
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.primary().name, "random_forest");
        assert!(!store.lookup(Some("svm")).is_loaded());
    }

    #[test]
    fn test_load_from_empty_dir_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::load(&config_for(dir.path()));

        assert_eq!(store.entries().len(), 5);
        assert_eq!(store.loaded_count(), 0);
        assert_eq!(store.lookup(Some("svm")).name, "random_forest");
    }

    #[test]
    fn test_classifier_without_preprocessor_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("random_forest_model.onnx"), b"not a model").unwrap();

        let store = ModelStore::load(&config_for(dir.path()));
        assert!(!store.primary().is_loaded());
    }

    #[test]
    fn test_corrupt_preprocessor_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("svm_preprocessor.json"), "{ broken").unwrap();
        std::fs::write(dir.path().join(SHARED_PREPROCESSOR), "[]").unwrap();

        let store = ModelStore::load(&config_for(dir.path()));
        assert_eq!(store.loaded_count(), 0);
    }

    const TWO_COLUMN_JSON: &str = r#"{
        "numeric": [
            {"column": "Data Size (KB)", "mean": 511.5, "scale": 1.0},
            {"column": "Processing Time (ms)", "mean": 33.0, "scale": 1.0}
        ]
    }"#;

    fn copy_fixture(dir: &Path, target: &str) {
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/inference/testdata/linear_2f.onnx");
        std::fs::copy(fixture, dir.join(target)).unwrap();
    }

    #[test]
    fn test_feature_width_mismatch_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixture(dir.path(), "random_forest_model.onnx");
        // seven encoded features against a two-input graph
        std::fs::write(dir.path().join(SHARED_PREPROCESSOR), SAMPLE_JSON).unwrap();

        let err = load_model(dir.path(), "random_forest", Some(&preprocessor())).err().unwrap();
        assert!(matches!(err, InferenceError::InvalidArtifact(msg) if msg.contains("expects 2 features")));

        let store = ModelStore::load(&config_for(dir.path()));
        assert!(!store.primary().is_loaded());
        assert_eq!(store.loaded_count(), 0);
    }

    #[test]
    fn test_matching_pair_loads_and_predicts() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixture(dir.path(), "random_forest_model.onnx");
        std::fs::write(dir.path().join("random_forest_preprocessor.json"), TWO_COLUMN_JSON).unwrap();

        let store = ModelStore::load(&config_for(dir.path()));
        assert_eq!(store.loaded_count(), 1);

        // sample record encodes to [1.0, 2.0]
        let record = crate::models::TelemetryRecord::adapt(&crate::models::telemetry::tests::sample_bag("9")).unwrap();
        let result = crate::inference::engine::predict(&record, store.lookup(None)).unwrap();
        assert_eq!(result.label, crate::models::ThreatLabel::Mitigated);
        assert_eq!(result.confidence, 73.1);
        assert_eq!(result.model_used, "random_forest");
    }

    #[test]
    fn test_category_options() {
        let store = ModelStore::from_entries(
            vec![
                ModelEntry::absent("svm"),
                ModelEntry::loaded("random_forest", Box::new(Fixed(1)), preprocessor()),
            ],
            "random_forest",
        );
        assert_eq!(store.category_options("IoT Layer"), vec!["Application", "Network", "Perception"]);
        assert!(store.category_options("Request Type").is_empty());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(ModelEntry::absent("random_forest").display_name(), "Random Forest");
        assert_eq!(ModelEntry::absent("svm").display_name(), "SVM");
    }
}
