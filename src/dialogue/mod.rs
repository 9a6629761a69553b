//! Conversational diagnosis session engine.
//!
//! Pipeline per turn: classify the latest assistant prompt, pick an input
//! affordance, collect one answer, send it, file it into its bucket once the
//! backend acknowledged it, repeat until a diagnosis arrives.

pub mod aggregate;
pub mod classify;
pub mod controller;
pub mod format;
pub mod input;
pub mod session;
pub mod transcript;
pub mod types;

pub use aggregate::{apply, split_symptoms, Capture, CaptureBucket, CapturedState};
pub use classify::{classify_prompt, classify_response};
pub use controller::{PendingTurn, SessionController, SessionPhase};
pub use format::format_diagnosis;
pub use input::{
    quick_replies, select_input, severity_band, AnswerDraft, InputDescriptor, SeverityBand,
};
pub use session::Session;
pub use transcript::TranscriptStore;
pub use types::*;

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Could not start a session: {0}")]
    StartFailed(TransportError),

    #[error("Could not send answer: {0}")]
    SubmissionFailed(TransportError),

    #[error("{message}")]
    RateLimited { message: String },

    #[error("No active session")]
    NotActive,

    #[error("Session is complete; restart to begin a new one")]
    AlreadyComplete,

    #[error("Answer is empty")]
    EmptyAnswer,

    #[error("A previous answer is still being processed")]
    RequestInFlight,

    #[error("Answer does not fit the requested input: {0}")]
    InvalidDraft(String),
}

impl SessionError {
    /// Whether the caller should redirect the user to sign in.
    pub fn needs_authentication(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
