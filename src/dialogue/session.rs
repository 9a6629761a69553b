use chrono::{DateTime, Local};

use super::aggregate::CapturedState;
use super::transcript::TranscriptStore;
use super::types::PromptCategory;
use crate::models::{DiagnosisRecord, Message};
use crate::transport::SessionId;

/// One diagnostic conversation. Only the controller mutates it.
#[derive(Debug, Clone)]
pub struct Session {
    pub(super) id: SessionId,
    pub(super) transcript: TranscriptStore,
    pub(super) captured: CapturedState,
    pub(super) diagnosis_results: Option<Vec<DiagnosisRecord>>,
    pub(super) is_complete: bool,
    pub(super) started_at: DateTime<Local>,
    /// Category of the latest assistant message.
    pub(super) prompt_category: PromptCategory,
}

impl Session {
    /// Fresh session whose transcript holds only the greeting.
    pub(super) fn open(id: SessionId, greeting: Message, category: PromptCategory) -> Self {
        let mut transcript = TranscriptStore::new();
        transcript.append(greeting);
        Self {
            id,
            transcript,
            captured: CapturedState::default(),
            diagnosis_results: None,
            is_complete: false,
            started_at: Local::now(),
            prompt_category: category,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    pub fn captured(&self) -> &CapturedState {
        &self.captured
    }

    pub fn symptoms(&self) -> &[String] {
        &self.captured.symptoms
    }

    pub fn diagnosis_results(&self) -> Option<&[DiagnosisRecord]> {
        self.diagnosis_results.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn prompt_category(&self) -> PromptCategory {
        self.prompt_category
    }

    /// Text of the prompt the user is currently answering.
    pub fn current_prompt(&self) -> &str {
        self.transcript
            .last_assistant()
            .map(|m| m.text())
            .unwrap_or_default()
    }

    /// Number of answers the user has sent.
    pub fn user_turns(&self) -> usize {
        self.transcript.iter().filter(|m| !m.is_assistant()).count()
    }
}
