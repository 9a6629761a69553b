use serde::{Deserialize, Serialize};

use crate::models::DiagnosisRecord;

/// What kind of answer the latest assistant prompt is asking for.
///
/// Categories that capture into a keyed bucket carry the sub-tag of the
/// trigger phrase that matched, which doubles as the stable storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "topic", rename_all = "snake_case")]
pub enum PromptCategory {
    SessionOptIn,
    MoodIntro,
    SubjectIdentity,
    SimpleFact(FactTopic),
    TimingOrIntensity(TimingAspect),
    CareFact(CareTopic),
    SymptomCapture,
    BinaryFact,
    DiagnosisReady,
    Freeform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactTopic {
    Substances,
    Travel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingAspect {
    Onset,
    Severity,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareTopic {
    Doctor,
    Medication,
}

/// Stable key an answer is filed under inside its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKey {
    IsSelf,
    Substances,
    Travel,
    Onset,
    Severity,
    Temperature,
    Doctor,
    Medication,
}

/// The session's answer accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Symptoms,
    BackgroundTraits,
    TimingIntensity,
    CareMedication,
}

impl PromptCategory {
    /// Bucket that answers to this category are filed into, if any.
    pub fn bucket(&self) -> Option<Bucket> {
        match self {
            Self::SubjectIdentity | Self::SimpleFact(_) => Some(Bucket::BackgroundTraits),
            Self::TimingOrIntensity(_) => Some(Bucket::TimingIntensity),
            Self::CareFact(_) => Some(Bucket::CareMedication),
            Self::SymptomCapture => Some(Bucket::Symptoms),
            Self::SessionOptIn
            | Self::MoodIntro
            | Self::BinaryFact
            | Self::DiagnosisReady
            | Self::Freeform => None,
        }
    }

    /// Key for keyed buckets. `None` for symptoms and non-capturing prompts.
    pub fn capture_key(&self) -> Option<CaptureKey> {
        match self {
            Self::SubjectIdentity => Some(CaptureKey::IsSelf),
            Self::SimpleFact(FactTopic::Substances) => Some(CaptureKey::Substances),
            Self::SimpleFact(FactTopic::Travel) => Some(CaptureKey::Travel),
            Self::TimingOrIntensity(TimingAspect::Onset) => Some(CaptureKey::Onset),
            Self::TimingOrIntensity(TimingAspect::Severity) => Some(CaptureKey::Severity),
            Self::TimingOrIntensity(TimingAspect::Temperature) => Some(CaptureKey::Temperature),
            Self::CareFact(CareTopic::Doctor) => Some(CaptureKey::Doctor),
            Self::CareFact(CareTopic::Medication) => Some(CaptureKey::Medication),
            _ => None,
        }
    }
}

/// One answer filed into a keyed bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedAnswer {
    pub key: CaptureKey,
    /// Exact prompt text that elicited the answer.
    pub prompt: String,
    pub answer: String,
}

/// Result of a completed `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant asked another question.
    Continued { category: PromptCategory },
    /// The assistant delivered its diagnosis; the session is now complete.
    Completed { results: Vec<DiagnosisRecord> },
    /// The response belonged to a session that has since been replaced.
    Discarded,
}
