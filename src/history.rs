//! Archive of finished diagnosis sessions, browsable separately from the
//! live conversation.
//!
//! The controller records a summary when a session completes or when an
//! abandoned session with answers is restarted. Persistence is an explicit
//! `save`/`load` against a JSON file.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::dialogue::Session;

/// Oldest entries are dropped beyond this many.
pub const MAX_HISTORY_ENTRIES: usize = 50;

const TITLE_MAX_CHARS: usize = 50;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid history file: {0}")]
    Json(#[from] serde_json::Error),
}

/// One archived session, as shown in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub session_id: String,
    pub title: String,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub message_count: usize,
    pub symptoms: Vec<String>,
    pub top_diagnosis: Option<String>,
    pub completed: bool,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        let first_answer = session
            .transcript()
            .iter()
            .find(|m| !m.is_assistant())
            .map(|m| m.text())
            .unwrap_or_default();
        let title_source = if session.symptoms().is_empty() {
            first_answer.to_string()
        } else {
            session.symptoms().join(", ")
        };

        let top_diagnosis = session
            .diagnosis_results()
            .and_then(|results| results.iter().max_by_key(|r| r.confidence))
            .map(|r| r.disease.clone());

        Self {
            id: Uuid::new_v4(),
            session_id: session.id().to_string(),
            title: generate_title(&title_source),
            started_at: session.started_at(),
            ended_at: Local::now(),
            message_count: session.transcript().len(),
            symptoms: session.symptoms().to_vec(),
            top_diagnosis,
            completed: session.is_complete(),
        }
    }
}

/// Generate a session title from its symptoms or first answer.
/// Truncates at 50 characters with "..." if longer, handling UTF-8 correctly.
pub fn generate_title(source: &str) -> String {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return "Symptom check".to_string();
    }

    match trimmed.char_indices().nth(TITLE_MAX_CHARS) {
        Some((boundary, _)) => format!("{}...", &trimmed[..boundary]),
        None => trimmed.to_string(),
    }
}

/// Archived session summaries, oldest first in storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    entries: Vec<SessionSummary>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: SessionSummary) {
        tracing::debug!(
            session_id = %summary.session_id,
            completed = summary.completed,
            "Archiving session"
        );
        self.entries.push(summary);
        if self.entries.len() > MAX_HISTORY_ENTRIES {
            let excess = self.entries.len() - MAX_HISTORY_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    /// Newest first.
    pub fn list(&self) -> Vec<&SessionSummary> {
        self.entries.iter().rev().collect()
    }

    pub fn get(&self, id: &Uuid) -> Option<&SessionSummary> {
        self.entries.iter().find(|e| e.id == *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from a JSON file. A missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(entries = self.entries.len(), "Session history saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str) -> SessionSummary {
        SessionSummary {
            id: Uuid::new_v4(),
            session_id: format!("sid-{title}"),
            title: title.to_string(),
            started_at: Local::now(),
            ended_at: Local::now(),
            message_count: 4,
            symptoms: vec!["cough".into()],
            top_diagnosis: Some("Common cold".into()),
            completed: true,
        }
    }

    #[test]
    fn title_short_text_unchanged() {
        assert_eq!(generate_title("  headache, fever "), "headache, fever");
    }

    #[test]
    fn title_empty_gets_default() {
        assert_eq!(generate_title("   "), "Symptom check");
    }

    #[test]
    fn title_truncates_long_text() {
        let long = "a".repeat(80);
        let title = generate_title(&long);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn title_truncation_respects_utf8() {
        let long = "é".repeat(60);
        let title = generate_title(&long);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn list_is_newest_first() {
        let mut history = SessionHistory::new();
        history.record(summary("first"));
        history.record(summary("second"));
        let titles: Vec<&str> = history.list().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn get_finds_by_id() {
        let mut history = SessionHistory::new();
        let entry = summary("only");
        let id = entry.id;
        history.record(entry);
        assert_eq!(history.get(&id).unwrap().title, "only");
        assert!(history.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn oldest_entries_are_dropped_past_limit() {
        let mut history = SessionHistory::new();
        for i in 0..(MAX_HISTORY_ENTRIES + 5) {
            history.record(summary(&i.to_string()));
        }
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history.list().last().unwrap().title, "5");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut history = SessionHistory::new();
        history.record(summary("saved"));
        history.save(&path).unwrap();

        let loaded = SessionHistory::load(&path).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SessionHistory::load(&dir.path().join("none.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn load_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[[[").unwrap();
        assert!(matches!(SessionHistory::load(&path), Err(HistoryError::Json(_))));
    }
}
