//! Feature preprocessor
//!
//! JSON export of the fitted scaler + one-hot column transformer.
//! Output layout: scaled numeric columns, then one one-hot block per
//! categorical column, both in artifact order.

use std::collections::HashSet;
use std::path::Path;

use ndarray::Array2;
use serde::Deserialize;

use super::InferenceError;
use crate::models::{TelemetryRecord, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};

/// Standard-scaled numeric column
#[derive(Debug, Clone, Deserialize)]
pub struct NumericColumn {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

/// One-hot encoded categorical column
#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Preprocessor {
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    /// Load and validate an artifact from disk
    pub fn from_file(path: &Path) -> Result<Self, InferenceError> {
        if !path.exists() {
            return Err(InferenceError::NotFound(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::InvalidArtifact(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&raw)
            .map_err(|e| InferenceError::InvalidArtifact(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(raw: &str) -> Result<Self, InferenceError> {
        let preprocessor: Self = serde_json::from_str(raw)
            .map_err(|e| InferenceError::InvalidArtifact(e.to_string()))?;
        preprocessor.validate()?;
        Ok(preprocessor)
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.numeric.is_empty() && self.categorical.is_empty() {
            return Err(InferenceError::InvalidArtifact("no columns".into()));
        }

        let mut seen = HashSet::new();
        for col in &self.numeric {
            if !NUMERIC_COLUMNS.contains(&col.column.as_str()) {
                return Err(InferenceError::InvalidArtifact(format!("unknown numeric column '{}'", col.column)));
            }
            if !col.mean.is_finite() || !col.scale.is_finite() {
                return Err(InferenceError::InvalidArtifact(format!("non-finite scaling for '{}'", col.column)));
            }
            if !seen.insert(col.column.as_str()) {
                return Err(InferenceError::InvalidArtifact(format!("duplicate column '{}'", col.column)));
            }
        }
        for col in &self.categorical {
            if !CATEGORICAL_COLUMNS.contains(&col.column.as_str()) {
                return Err(InferenceError::InvalidArtifact(format!("unknown categorical column '{}'", col.column)));
            }
            if col.categories.is_empty() {
                return Err(InferenceError::InvalidArtifact(format!("no categories for '{}'", col.column)));
            }
            if !seen.insert(col.column.as_str()) {
                return Err(InferenceError::InvalidArtifact(format!("duplicate column '{}'", col.column)));
            }
        }

        Ok(())
    }

    /// Width of the encoded row
    pub fn feature_count(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
    }

    /// Known categories for a column, empty when not encoded
    pub fn categories(&self, column: &str) -> &[String] {
        self.categorical
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.categories.as_slice())
            .unwrap_or(&[])
    }

    /// Encode one record as a `1 × feature_count` row
    pub fn transform(&self, record: &TelemetryRecord) -> Result<Array2<f32>, InferenceError> {
        let mut row = Vec::with_capacity(self.feature_count());

        for col in &self.numeric {
            let value = record
                .numeric(&col.column)
                .ok_or_else(|| InferenceError::InvalidArtifact(format!("unknown numeric column '{}'", col.column)))?;
            // sklearn leaves zero-variance columns unscaled
            let scale = if col.scale == 0.0 { 1.0 } else { col.scale };
            row.push(((value - col.mean) / scale) as f32);
        }

        for col in &self.categorical {
            let value = record
                .categorical(&col.column)
                .ok_or_else(|| InferenceError::InvalidArtifact(format!("unknown categorical column '{}'", col.column)))?;
            // unknown categories encode as all zeros
            row.extend(col.categories.iter().map(|c| if c == value { 1.0f32 } else { 0.0 }));
        }

        let width = row.len();
        Array2::from_shape_vec((1, width), row)
            .map_err(|e| InferenceError::InvalidArtifact(format!("Array error: {}", e)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::telemetry::tests::sample_bag;

    pub(crate) const SAMPLE_JSON: &str = r#"{
        "numeric": [
            {"column": "Data Size (KB)", "mean": 500.0, "scale": 25.0},
            {"column": "Attack Severity (0-10)", "mean": 5.0, "scale": 0.0}
        ],
        "categorical": [
            {"column": "IoT Layer", "categories": ["Application", "Network", "Perception"]},
            {"column": "Consensus Mechanism", "categories": ["PoS", "PoW"]}
        ]
    }"#;

    #[test]
    fn test_transform_layout() {
        let pre = Preprocessor::from_json(SAMPLE_JSON).unwrap();
        assert_eq!(pre.feature_count(), 7);

        let record = TelemetryRecord::adapt(&sample_bag("3")).unwrap();
        let row = pre.transform(&record).unwrap();
        assert_eq!(row.shape(), &[1, 7]);
        assert_eq!(row[[0, 0]], 0.5);
        // zero scale keeps the centered value
        assert_eq!(row[[0, 1]], -2.0);
        assert_eq!(row.row(0).to_vec()[2..], [0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_is_all_zeros() {
        let pre = Preprocessor::from_json(SAMPLE_JSON).unwrap();
        let mut record = TelemetryRecord::adapt(&sample_bag("3")).unwrap();
        record.iot_layer = "Edge".into();

        let row = pre.transform(&record).unwrap();
        assert_eq!(row.row(0).to_vec()[2..5], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rejects_unknown_column() {
        let raw = r#"{"numeric": [{"column": "Latency", "mean": 0.0, "scale": 1.0}]}"#;
        assert!(matches!(Preprocessor::from_json(raw), Err(InferenceError::InvalidArtifact(_))));
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(Preprocessor::from_json("{}").is_err());
        assert!(Preprocessor::from_json("not json").is_err());
    }

    #[test]
    fn test_categories_lookup() {
        let pre = Preprocessor::from_json(SAMPLE_JSON).unwrap();
        assert_eq!(pre.categories("Consensus Mechanism"), ["PoS", "PoW"]);
        assert!(pre.categories("Request Type").is_empty());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor.json");
        assert!(matches!(Preprocessor::from_file(&path), Err(InferenceError::NotFound(_))));

        std::fs::write(&path, SAMPLE_JSON).unwrap();
        assert_eq!(Preprocessor::from_file(&path).unwrap().feature_count(), 7);

        std::fs::write(&path, "{ corrupt").unwrap();
        assert!(matches!(Preprocessor::from_file(&path), Err(InferenceError::InvalidArtifact(_))));
    }
}
