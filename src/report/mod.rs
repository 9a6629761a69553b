//! Structured view of AI-generated lab analysis reports.

pub mod parser;
pub mod sanitize;

pub use parser::parse_report;
pub use sanitize::{classify_status, strip_decorations};

use crate::models::ReportRecord;

/// What to show for a report: the parsed record, or the raw text when the
/// mandatory sections could not be found.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportDisplay {
    Structured(ReportRecord),
    Raw(String),
}

impl ReportDisplay {
    pub fn from_text(text: &str) -> Self {
        match parse_report(text) {
            Some(record) => Self::Structured(record),
            None => Self::Raw(text.to_string()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}
