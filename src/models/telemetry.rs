//! Telemetry record and the feature adapter that builds it

use std::collections::HashMap;

use serde_json::{Map, Value};
use validator::Validate;

use crate::{AppError, AppResult};

/// Numeric columns, in the order the preprocessor was fitted on
pub const NUMERIC_COLUMNS: [&str; 5] = [
    "Data Size (KB)",
    "Processing Time (ms)",
    "Attack Severity (0-10)",
    "Blockchain Transaction Time (ms)",
    "Energy Consumption (mJ)",
];

/// Categorical columns, in the order the preprocessor was fitted on
pub const CATEGORICAL_COLUMNS: [&str; 4] = [
    "IoT Layer",
    "Request Type",
    "Security Threat Type",
    "Consensus Mechanism",
];

/// One input field: request key, accepted aliases, column label
pub struct FieldSpec {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
    pub column: &'static str,
    pub numeric: bool,
}

/// All nine telemetry fields, in form order
pub static FIELDS: [FieldSpec; 9] = [
    FieldSpec { key: "data_size", aliases: &["data_size_kb"], column: NUMERIC_COLUMNS[0], numeric: true },
    FieldSpec { key: "processing_time", aliases: &["processing_time_ms"], column: NUMERIC_COLUMNS[1], numeric: true },
    FieldSpec { key: "attack_severity", aliases: &[], column: NUMERIC_COLUMNS[2], numeric: true },
    FieldSpec {
        key: "blockchain_time",
        aliases: &["blockchain_transaction_time", "blockchain_transaction_time_ms"],
        column: NUMERIC_COLUMNS[3],
        numeric: true,
    },
    FieldSpec { key: "energy", aliases: &["energy_consumption", "energy_consumption_mj"], column: NUMERIC_COLUMNS[4], numeric: true },
    FieldSpec { key: "iot_layer", aliases: &[], column: CATEGORICAL_COLUMNS[0], numeric: false },
    FieldSpec { key: "request_type", aliases: &[], column: CATEGORICAL_COLUMNS[1], numeric: false },
    FieldSpec { key: "threat_type", aliases: &["security_threat_type"], column: CATEGORICAL_COLUMNS[2], numeric: false },
    FieldSpec { key: "consensus", aliases: &["consensus_mechanism"], column: CATEGORICAL_COLUMNS[3], numeric: false },
];

/// Key carrying the requested model name
pub const MODEL_TYPE_KEY: &str = "model_type";

/// Untyped key/value input, as posted by the form or the JSON API
#[derive(Debug, Clone, Default)]
pub struct FieldBag(HashMap<String, String>);

impl FieldBag {
    /// Value for `key`, trimmed; blank counts as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value for a telemetry field, trying the canonical key then aliases
    pub fn field(&self, spec: &FieldSpec) -> Option<&str> {
        std::iter::once(spec.key)
            .chain(spec.aliases.iter().copied())
            .find_map(|key| self.get(key))
    }

    /// Requested model, if any
    pub fn model_type(&self) -> Option<&str> {
        self.get(MODEL_TYPE_KEY)
    }

    /// Build from a JSON object. Strings are kept, numbers and booleans
    /// stringified; null, arrays and objects are dropped.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let fields = object
            .iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((key.clone(), value))
            })
            .collect();
        Self(fields)
    }
}

impl From<HashMap<String, String>> for FieldBag {
    fn from(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }
}

/// Presence check over the nine fields before parsing
#[derive(Debug, Validate)]
struct RawTelemetry {
    #[validate(required)]
    data_size: Option<String>,
    #[validate(required)]
    processing_time: Option<String>,
    #[validate(required)]
    attack_severity: Option<String>,
    #[validate(required)]
    blockchain_time: Option<String>,
    #[validate(required)]
    energy: Option<String>,
    #[validate(required)]
    iot_layer: Option<String>,
    #[validate(required)]
    request_type: Option<String>,
    #[validate(required)]
    threat_type: Option<String>,
    #[validate(required)]
    consensus: Option<String>,
}

impl RawTelemetry {
    fn from_bag(bag: &FieldBag) -> Self {
        let [data_size, processing_time, attack_severity, blockchain_time, energy, iot_layer, request_type, threat_type, consensus] =
            FIELDS.each_ref().map(|spec| bag.field(spec).map(str::to_string));

        Self {
            data_size,
            processing_time,
            attack_severity,
            blockchain_time,
            energy,
            iot_layer,
            request_type,
            threat_type,
            consensus,
        }
    }
}

/// One IoT security observation
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub data_size_kb: f64,
    pub processing_time_ms: f64,
    pub attack_severity: f64,
    pub blockchain_time_ms: f64,
    pub energy_mj: f64,
    pub iot_layer: String,
    pub request_type: String,
    pub threat_type: String,
    pub consensus: String,
}

impl TelemetryRecord {
    /// Map a raw input bag onto the fixed schema.
    ///
    /// Every missing field is reported at once; numeric fields must parse as
    /// finite floats.
    pub fn adapt(bag: &FieldBag) -> AppResult<Self> {
        let raw = RawTelemetry::from_bag(bag);

        if let Err(errors) = raw.validate() {
            let missing_keys: Vec<String> = errors
                .field_errors()
                .into_iter()
                .map(|(key, _)| {
                    let key: &str = &key;
                    key.to_string()
                })
                .collect();

            let missing: Vec<&str> = FIELDS
                .iter()
                .filter(|spec| missing_keys.iter().any(|k| k == spec.key))
                .map(|spec| spec.column)
                .collect();

            return Err(AppError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let mut numeric = [0.0f64; 5];
        let mut invalid = Vec::new();
        for (slot, spec) in numeric.iter_mut().zip(FIELDS.iter().filter(|s| s.numeric)) {
            match bag.field(spec).map(|v| v.parse::<f64>()) {
                Some(Ok(value)) if value.is_finite() => *slot = value,
                _ => invalid.push(spec.column),
            }
        }

        if !invalid.is_empty() {
            return Err(AppError::Validation(format!(
                "Invalid numeric value for: {}",
                invalid.join(", ")
            )));
        }

        let text = |spec: &FieldSpec| bag.field(spec).unwrap_or_default().to_string();

        Ok(Self {
            data_size_kb: numeric[0],
            processing_time_ms: numeric[1],
            attack_severity: numeric[2],
            blockchain_time_ms: numeric[3],
            energy_mj: numeric[4],
            iot_layer: text(&FIELDS[5]),
            request_type: text(&FIELDS[6]),
            threat_type: text(&FIELDS[7]),
            consensus: text(&FIELDS[8]),
        })
    }

    /// Numeric value by column label
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            c if c == NUMERIC_COLUMNS[0] => Some(self.data_size_kb),
            c if c == NUMERIC_COLUMNS[1] => Some(self.processing_time_ms),
            c if c == NUMERIC_COLUMNS[2] => Some(self.attack_severity),
            c if c == NUMERIC_COLUMNS[3] => Some(self.blockchain_time_ms),
            c if c == NUMERIC_COLUMNS[4] => Some(self.energy_mj),
            _ => None,
        }
    }

    /// Categorical value by column label
    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            c if c == CATEGORICAL_COLUMNS[0] => Some(&self.iot_layer),
            c if c == CATEGORICAL_COLUMNS[1] => Some(&self.request_type),
            c if c == CATEGORICAL_COLUMNS[2] => Some(&self.threat_type),
            c if c == CATEGORICAL_COLUMNS[3] => Some(&self.consensus),
            _ => None,
        }
    }
}
