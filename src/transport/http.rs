use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    AssistantReply, DiagnosisBackend, IdentityHint, SessionGreeting, SessionId, TransportError,
    DEFAULT_RATE_LIMIT_MESSAGE,
};
use crate::config::BackendConfig;
use crate::models::{clamp_percent, DiagnosisRecord, Severity};

/// JSON-over-HTTP client for the remote diagnostic assistant.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String, TransportError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.post(&url).json(body).send().map_err(|e| {
            if e.is_connect() {
                TransportError::Network(format!("cannot connect to {}", self.base_url))
            } else if e.is_timeout() {
                TransportError::Network(format!("request timed out after {}s", self.timeout_secs))
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| TransportError::Network(format!("failed to read response body: {e}")))?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(path, "Diagnosis backend rate limited the request");
            return Err(TransportError::RateLimited {
                message: rate_limit_message(&text),
            });
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct StartRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Deserialize)]
struct StartResponse {
    session_id: String,
    message: String,
}

#[derive(Serialize)]
struct AnswerRequest<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct AnswerResponse {
    message: String,
    #[serde(default)]
    diagnosis: Option<Vec<serde_json::Value>>,
}

/// Diagnosis entry as the backend sends it. Percentages may be floats.
#[derive(Deserialize)]
struct RawDiagnosis {
    disease: String,
    confidence: f64,
    severity: String,
    #[serde(alias = "symptomCoverage")]
    symptom_coverage: f64,
    #[serde(default, alias = "keySymptoms")]
    key_symptoms: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl DiagnosisBackend for HttpBackend {
    fn start_session(
        &self,
        hint: Option<&IdentityHint>,
    ) -> Result<SessionGreeting, TransportError> {
        let body = StartRequest {
            user_id: hint.and_then(|h| h.user_id.as_deref()),
            name: hint.and_then(|h| h.name.as_deref()),
        };
        let text = self.post("/chat/start", &body)?;
        decode_greeting(&text)
    }

    fn post_answer(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<AssistantReply, TransportError> {
        let body = AnswerRequest {
            session_id: session_id.as_str(),
            message: text,
        };
        let text = self.post("/chat/message", &body)?;
        decode_reply(&text)
    }
}

/// Decode the body of a successful `/chat/start` call.
pub fn decode_greeting(body: &str) -> Result<SessionGreeting, TransportError> {
    let parsed: StartResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    if parsed.session_id.trim().is_empty() {
        return Err(TransportError::Decode("empty session_id".into()));
    }
    Ok(SessionGreeting {
        session_id: SessionId::new(parsed.session_id),
        message: parsed.message,
    })
}

/// Decode the body of a successful `/chat/message` call.
pub fn decode_reply(body: &str) -> Result<AssistantReply, TransportError> {
    let parsed: AnswerResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(AssistantReply {
        message: parsed.message,
        diagnosis: parsed.diagnosis.map(|items| decode_diagnosis_lenient(&items)),
    })
}

/// Decode diagnosis entries leniently: skip items that fail to deserialize
/// or carry an unknown severity.
pub fn decode_diagnosis_lenient(items: &[serde_json::Value]) -> Vec<DiagnosisRecord> {
    items
        .iter()
        .filter_map(|v| serde_json::from_value::<RawDiagnosis>(v.clone()).ok())
        .filter_map(|raw| {
            let severity = raw.severity.parse::<Severity>().ok()?;
            Some(DiagnosisRecord {
                disease: raw.disease.trim().to_string(),
                confidence: clamp_percent(raw.confidence),
                severity,
                symptom_coverage: clamp_percent(raw.symptom_coverage),
                key_symptoms: raw.key_symptoms,
            })
        })
        .filter(|d| !d.disease.is_empty())
        .collect()
}

/// User-facing message carried by a 429 response, or the default prompt to
/// sign in.
fn rate_limit_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail.or(b.message))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_RATE_LIMIT_MESSAGE.to_string())
}
