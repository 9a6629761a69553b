use serde::{Deserialize, Serialize};

use super::types::{Bucket, CaptureKey, CapturedAnswer, PromptCategory};

/// Ordered answers filed under stable keys, with the prompt text kept as
/// metadata. Re-answering the identical prompt replaces the earlier entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureBucket {
    entries: Vec<CapturedAnswer>,
}

impl CaptureBucket {
    pub fn insert(&mut self, key: CaptureKey, prompt: &str, answer: &str) {
        let entry = CapturedAnswer {
            key,
            prompt: prompt.to_string(),
            answer: answer.to_string(),
        };
        match self.entries.iter_mut().find(|e| e.prompt == prompt) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Latest answer filed under `key`.
    pub fn get(&self, key: CaptureKey) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.answer.as_str())
    }

    /// Answer given to the exact prompt text.
    pub fn get_by_prompt(&self, prompt: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.prompt == prompt)
            .map(|e| e.answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapturedAnswer> {
        self.entries.iter()
    }
}

/// All answers accumulated during one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedState {
    pub symptoms: Vec<String>,
    pub background_traits: CaptureBucket,
    pub timing_intensity: CaptureBucket,
    pub care_medication: CaptureBucket,
}

impl CapturedState {
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
            && self.background_traits.is_empty()
            && self.timing_intensity.is_empty()
            && self.care_medication.is_empty()
    }
}

/// What `apply` did with an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The prompt does not capture into any bucket.
    Skipped,
    /// `count` symptom labels were appended.
    Symptoms { count: usize },
    Keyed { bucket: Bucket, key: CaptureKey },
}

/// File `answer` into the bucket matching the prompt's category.
pub fn apply(
    state: &mut CapturedState,
    category: &PromptCategory,
    prompt: &str,
    answer: &str,
) -> Capture {
    if *category == PromptCategory::SymptomCapture {
        let labels = split_symptoms(answer);
        let count = labels.len();
        state.symptoms.extend(labels);
        return Capture::Symptoms { count };
    }

    let (Some(bucket), Some(key)) = (category.bucket(), category.capture_key()) else {
        return Capture::Skipped;
    };

    let value = if key == CaptureKey::IsSelf {
        normalize_subject(answer)
    } else {
        answer
    };

    let target = match bucket {
        Bucket::BackgroundTraits => &mut state.background_traits,
        Bucket::TimingIntensity => &mut state.timing_intensity,
        Bucket::CareMedication => &mut state.care_medication,
        Bucket::Symptoms => return Capture::Skipped,
    };
    target.insert(key, prompt, value);

    Capture::Keyed { bucket, key }
}

/// Split a comma-separated symptom answer into trimmed, non-empty labels.
/// Repeats are preserved.
pub fn split_symptoms(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// "yes" when the answer names the user themself, otherwise "no".
fn normalize_subject(answer: &str) -> &'static str {
    if answer.trim().eq_ignore_ascii_case("myself") {
        "yes"
    } else {
        "no"
    }
}
