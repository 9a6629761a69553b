use super::types::{CareTopic, FactTopic, PromptCategory, TimingAspect};

/// Classify the latest assistant prompt using keyword heuristics.
///
/// Rules are checked in a fixed precedence order; the first rule with a
/// matching phrase wins. Matching is case-insensitive containment.
pub fn classify_prompt(text: &str) -> PromptCategory {
    match_text(&text.to_lowercase()).unwrap_or(PromptCategory::Freeform)
}

/// Classify an assistant reply that may carry a diagnosis payload.
///
/// Textual rules still take precedence; the payload only decides between
/// `DiagnosisReady` and `Freeform` when no phrase matched.
pub fn classify_response(text: &str, has_diagnosis: bool) -> PromptCategory {
    match match_text(&text.to_lowercase()) {
        Some(category) => category,
        None if has_diagnosis => PromptCategory::DiagnosisReady,
        None => PromptCategory::Freeform,
    }
}

fn match_text(lower: &str) -> Option<PromptCategory> {
    if contains_any(lower, &["would you like to start a symptom analysis session"]) {
        return Some(PromptCategory::SessionOptIn);
    }

    if contains_any(lower, &["feeling today"]) {
        return Some(PromptCategory::MoodIntro);
    }

    if contains_any(lower, &["yourself or someone else"]) {
        return Some(PromptCategory::SubjectIdentity);
    }

    if let Some(topic) = first_match(
        lower,
        &[("substances", FactTopic::Substances), ("traveled", FactTopic::Travel)],
    ) {
        return Some(PromptCategory::SimpleFact(topic));
    }

    if let Some(aspect) = first_match(
        lower,
        &[
            ("symptoms start", TimingAspect::Onset),
            ("severe", TimingAspect::Severity),
            ("temperature", TimingAspect::Temperature),
        ],
    ) {
        return Some(PromptCategory::TimingOrIntensity(aspect));
    }

    if let Some(topic) = first_match(
        lower,
        &[("doctor", CareTopic::Doctor), ("medication", CareTopic::Medication)],
    ) {
        return Some(PromptCategory::CareFact(topic));
    }

    if contains_any(lower, &["symptoms"]) {
        return Some(PromptCategory::SymptomCapture);
    }

    if contains_any(lower, &["are you experiencing"]) {
        return Some(PromptCategory::BinaryFact);
    }

    None
}

fn contains_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

/// Sub-tag of the first phrase (in table order) contained in `text`.
fn first_match<T: Copy>(text: &str, table: &[(&str, T)]) -> Option<T> {
    table
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, tag)| *tag)
}
