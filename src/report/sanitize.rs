// Cleanup and marker detection for text pulled out of analysis reports.
// Reports are AI-generated and decorated with markdown and emoji; extracted
// fields keep only letters, digits, whitespace and a few punctuation marks.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ValueStatus;

/// Punctuation that survives stripping.
const ALLOWED_MARKS: &[char] = &[
    '.', ',', ':', ';', '(', ')', '-', '/', '%', '+', '<', '>', '=', '\'', '&', '^', '°',
];

const CRITICAL_GLYPHS: &[&str] = &["🔴", "❗", "‼"];

const ABNORMAL_GLYPHS: &[&str] = &["⚠", "🟡", "🟠"];

static CRITICAL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcritical\b").unwrap());

static ABNORMAL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:abnormal|high|low|borderline)\b").unwrap());

/// "not critical", "non-critical" and the like carry no status.
static NEGATED_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:not|non)[\s-]+(?:critical|abnormal|high|low|borderline)\b").unwrap()
});

/// Remove decorative marks and collapse whitespace.
pub fn strip_decorations(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ALLOWED_MARKS.contains(c))
        .collect();
    collapse_whitespace(&kept)
}

/// Classify a row's trailing status text. Critical markers win over
/// abnormal ones; anything unmarked is normal. Keywords count only as whole
/// words.
pub fn classify_status(text: &str) -> ValueStatus {
    let text = NEGATED_WORD.replace_all(text, " ");
    let has_glyph = |glyphs: &[&str]| glyphs.iter().any(|g| text.contains(g));

    if has_glyph(CRITICAL_GLYPHS) || CRITICAL_WORD.is_match(&text) {
        ValueStatus::Critical
    } else if has_glyph(ABNORMAL_GLYPHS) || ABNORMAL_WORD.is_match(&text) {
        ValueStatus::Abnormal
    } else {
        ValueStatus::Normal
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
