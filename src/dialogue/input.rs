use serde::{Deserialize, Serialize};

use super::types::{CareTopic, PromptCategory, TimingAspect};

/// One-tap choices offered next to the free-text symptom field.
pub const COMMON_SYMPTOMS: &[&str] = &[
    "Headache",
    "Fever",
    "Cough",
    "Fatigue",
    "Nausea",
    "Sore throat",
    "Dizziness",
    "Shortness of breath",
    "Chest pain",
    "Muscle aches",
];

pub const MOOD_OPTIONS: &[&str] = &["Great", "Good", "Okay", "Not great", "Unwell"];

pub const SUBJECT_OPTIONS: &[&str] = &["Myself", "Someone else"];

pub const ONSET_OPTIONS: &[&str] = &[
    "Today",
    "Yesterday",
    "2-3 days ago",
    "About a week ago",
    "More than a week ago",
];

pub const BINARY_OPTIONS: &[&str] = &["Yes", "No"];

pub const SEVERITY_MIN: u8 = 1;
pub const SEVERITY_MAX: u8 = 10;

/// Named range on the severity slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBand {
    pub label: String,
    pub min: u8,
    pub max: u8,
}

/// The abstract input mechanism the caller must render for a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputDescriptor {
    FreeText,
    BinaryChoice,
    FixedChoiceSet { options: Vec<String> },
    NumericSlider {
        min: u8,
        max: u8,
        step: u8,
        bands: Vec<SeverityBand>,
    },
    TagAutocomplete { suggestions: Vec<String> },
}

/// Value the user is composing for the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerDraft {
    Text(String),
    Numeric(u8),
}

impl AnswerDraft {
    /// Answer string sent to the backend. Numeric values are stringified.
    pub fn into_answer(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Numeric(value) => value.to_string(),
        }
    }
}

impl InputDescriptor {
    /// Whether a draft of this kind can be submitted through this input.
    pub fn accepts(&self, draft: &AnswerDraft) -> bool {
        match (self, draft) {
            (Self::NumericSlider { min, max, .. }, AnswerDraft::Numeric(v)) => {
                (*min..=*max).contains(v)
            }
            (Self::NumericSlider { .. }, AnswerDraft::Text(_)) => false,
            (_, AnswerDraft::Text(_)) => true,
            (_, AnswerDraft::Numeric(_)) => false,
        }
    }
}

/// Select the input affordance for a prompt category.
///
/// Returns `None` once a diagnosis has been delivered: no further input is
/// offered for a completed session.
pub fn select_input(category: &PromptCategory) -> Option<InputDescriptor> {
    let descriptor = match category {
        PromptCategory::SessionOptIn
        | PromptCategory::BinaryFact
        | PromptCategory::SimpleFact(_)
        | PromptCategory::CareFact(CareTopic::Doctor) => InputDescriptor::BinaryChoice,
        PromptCategory::MoodIntro => choices(MOOD_OPTIONS),
        PromptCategory::SubjectIdentity => choices(SUBJECT_OPTIONS),
        PromptCategory::TimingOrIntensity(TimingAspect::Severity) => severity_slider(),
        PromptCategory::TimingOrIntensity(TimingAspect::Onset) => choices(ONSET_OPTIONS),
        PromptCategory::TimingOrIntensity(TimingAspect::Temperature)
        | PromptCategory::CareFact(CareTopic::Medication)
        | PromptCategory::Freeform => InputDescriptor::FreeText,
        PromptCategory::SymptomCapture => InputDescriptor::TagAutocomplete {
            suggestions: to_owned(COMMON_SYMPTOMS),
        },
        PromptCategory::DiagnosisReady => return None,
    };
    Some(descriptor)
}

/// Options a choice-style descriptor offers (binary choices included).
pub fn quick_replies(descriptor: &InputDescriptor) -> Vec<String> {
    match descriptor {
        InputDescriptor::BinaryChoice => to_owned(BINARY_OPTIONS),
        InputDescriptor::FixedChoiceSet { options } => options.clone(),
        InputDescriptor::TagAutocomplete { suggestions } => suggestions.clone(),
        InputDescriptor::FreeText | InputDescriptor::NumericSlider { .. } => Vec::new(),
    }
}

/// Name of the severity band containing `value`, if any.
pub fn severity_band(value: u8) -> Option<&'static str> {
    match value {
        1..=3 => Some("Mild"),
        4..=7 => Some("Moderate"),
        8..=10 => Some("Severe"),
        _ => None,
    }
}

fn severity_slider() -> InputDescriptor {
    InputDescriptor::NumericSlider {
        min: SEVERITY_MIN,
        max: SEVERITY_MAX,
        step: 1,
        bands: vec![band("Mild", 1, 3), band("Moderate", 4, 7), band("Severe", 8, 10)],
    }
}

fn band(label: &str, min: u8, max: u8) -> SeverityBand {
    SeverityBand {
        label: label.to_string(),
        min,
        max,
    }
}

fn choices(options: &[&str]) -> InputDescriptor {
    InputDescriptor::FixedChoiceSet {
        options: to_owned(options),
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
