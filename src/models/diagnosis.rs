use serde::{Deserialize, Serialize};

use super::enums::Severity;

/// A candidate condition returned by the backend when the session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub disease: String,
    /// 0-100
    pub confidence: u8,
    pub severity: Severity,
    /// 0-100
    pub symptom_coverage: u8,
    #[serde(default)]
    pub key_symptoms: Vec<String>,
}

/// Clamp a backend-supplied percentage into 0-100.
pub fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
