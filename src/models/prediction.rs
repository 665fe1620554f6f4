//! Prediction result and the verdict shown for it

/// Binary classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLabel {
    Detected = 0,
    Mitigated = 1,
}

impl ThreatLabel {
    pub fn from_class(class: i64) -> Option<Self> {
        match class {
            0 => Some(Self::Detected),
            1 => Some(Self::Mitigated),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// How the label was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMethod {
    Model,
    Fallback,
}

/// Per-request prediction, never stored
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub label: ThreatLabel,
    /// Percentage in [0, 100], one decimal
    pub confidence: f64,
    pub model_used: String,
    pub method: PredictionMethod,
}

impl PredictionResult {
    pub fn new(label: ThreatLabel, confidence: f64, model_used: impl Into<String>, method: PredictionMethod) -> Self {
        Self {
            label,
            confidence: round_confidence(confidence),
            model_used: model_used.into(),
            method,
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::for_label(self.label)
    }
}

/// Clamp to [0, 100] and round to one decimal place
pub fn round_confidence(percent: f64) -> f64 {
    if !percent.is_finite() {
        return 0.0;
    }
    (percent.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Display strings for a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub status: &'static str,
    /// Bootstrap contextual class (success, danger)
    pub color: &'static str,
    pub icon: &'static str,
    pub message: &'static str,
    pub recommendation: &'static str,
}

impl Verdict {
    pub const MITIGATED: Verdict = Verdict {
        status: "Threat Mitigated",
        color: "success",
        icon: "✅",
        message: "No immediate risk detected.",
        recommendation: "Security controls handled this event. Keep monitoring the device and its blockchain transactions as usual.",
    };

    pub const DETECTED: Verdict = Verdict {
        status: "Threat Detected",
        color: "danger",
        icon: "⚠️",
        message: "Action required!",
        recommendation: "Isolate the affected IoT node, review recent transactions for tampering and escalate to the security team.",
    };

    pub fn for_label(label: ThreatLabel) -> Self {
        match label {
            ThreatLabel::Mitigated => Self::MITIGATED,
            ThreatLabel::Detected => Self::DETECTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_mapping() {
        let ok = Verdict::for_label(ThreatLabel::Mitigated);
        assert_eq!(ok.status, "Threat Mitigated");
        assert_eq!(ok.color, "success");

        let bad = Verdict::for_label(ThreatLabel::Detected);
        assert_eq!(bad.status, "Threat Detected");
        assert_eq!(bad.color, "danger");
    }

    #[test]
    fn test_label_from_class() {
        assert_eq!(ThreatLabel::from_class(1), Some(ThreatLabel::Mitigated));
        assert_eq!(ThreatLabel::from_class(0), Some(ThreatLabel::Detected));
        assert_eq!(ThreatLabel::from_class(2), None);
        assert_eq!(ThreatLabel::Mitigated.as_u8(), 1);
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(87.6543), 87.7);
        assert_eq!(round_confidence(85.5), 85.5);
        assert_eq!(round_confidence(140.0), 100.0);
        assert_eq!(round_confidence(-3.0), 0.0);
        assert_eq!(round_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_result_rounds_on_construction() {
        let result = PredictionResult::new(ThreatLabel::Detected, 66.666, "svm", PredictionMethod::Model);
        assert_eq!(result.confidence, 66.7);
        assert_eq!(result.verdict().status, "Threat Detected");
    }
}
