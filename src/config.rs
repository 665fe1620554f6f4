//! Configuration module

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

/// Models shipped by the training notebooks, primary first
pub const DEFAULT_MODEL_NAMES: [&str; 5] = [
    "random_forest",
    "gradient_boosting",
    "logistic_regression",
    "decision_tree",
    "svm",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding model and preprocessor artifacts
    pub models_dir: PathBuf,

    /// Model names to look for, in selector order
    pub model_names: Vec<String>,

    /// Model used when `model_type` is absent, unknown or not loaded
    pub primary_model: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let primary_model = lookup("PRIMARY_MODEL")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_NAMES[0].to_string());

        let mut model_names: Vec<String> = lookup("MODEL_NAMES")
            .map(|names| {
                names
                    .split(',')
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect()
            })
            .filter(|names: &Vec<String>| !names.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_NAMES.iter().map(|n| n.to_string()).collect());
        let mut seen = HashSet::new();
        model_names.retain(|n| seen.insert(n.clone()));

        if !model_names.contains(&primary_model) {
            model_names.push(primary_model.clone());
        }

        Self {
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(5000),

            models_dir: lookup("MODELS_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("models")),

            model_names,
            primary_model,

            log_format: lookup("LOG_FORMAT")
                .map(|f| f.trim().to_lowercase())
                .unwrap_or_else(|| "pretty".to_string()),

            environment: lookup("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Emit JSON log lines instead of the human readable format
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}
