pub mod http;

pub use http::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DiagnosisRecord;

/// Message shown when the backend refuses a request for quota reasons and no
/// explanation came with it.
pub const DEFAULT_RATE_LIMIT_MESSAGE: &str =
    "You have reached the guest session limit. Please sign in to continue.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Diagnosis backend unreachable: {0}")]
    Network(String),

    #[error("Diagnosis backend returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Could not decode backend response: {0}")]
    Decode(String),
}

/// Backend-issued session token. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional identity passed when opening a session. Guests send none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGreeting {
    pub session_id: SessionId,
    pub message: String,
}

/// Result of posting one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub message: String,
    /// Present only on the final turn.
    pub diagnosis: Option<Vec<DiagnosisRecord>>,
}

impl AssistantReply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnosis: None,
        }
    }

    pub fn with_diagnosis(message: impl Into<String>, diagnosis: Vec<DiagnosisRecord>) -> Self {
        Self {
            message: message.into(),
            diagnosis: Some(diagnosis),
        }
    }
}

/// Remote diagnostic assistant (allows mocking).
pub trait DiagnosisBackend {
    fn start_session(
        &self,
        hint: Option<&IdentityHint>,
    ) -> Result<SessionGreeting, TransportError>;

    fn post_answer(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<AssistantReply, TransportError>;
}
