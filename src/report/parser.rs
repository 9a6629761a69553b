use std::sync::LazyLock;

use regex::Regex;

use super::sanitize::{classify_status, strip_decorations};
use crate::models::{Recommendations, ReportRecord, StatusCounts, ValueRow};

/// Top-level section labels, at line start, optionally wrapped in markdown.
static SECTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t>*#_-]*(summary|test results|status counts|recommendations)[ \t*_]*:[ \t*_]*",
    )
    .unwrap()
});

/// Sub-labels inside the recommendations section.
static RECOMMENDATION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>*#_-]*(lifestyle|follow[- ]?up|doctor)[\w \t*_-]*:[ \t*_]*").unwrap()
});

/// `Normal: <n> | Abnormal: <n> | Critical: <n>`, tolerating decoration
/// between the tokens.
static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bnormal[^|\n\d]*?:\s*(\d+)[^|\n]*\|[^|\n]*?abnormal[^|\n\d]*?:\s*(\d+)[^|\n]*\|[^|\n]*?critical[^|\n\d]*?:\s*(\d+)",
    )
    .unwrap()
});

/// `<name>: <number> <unit> (<range>) <status text>`. The unit must start
/// with a non-digit so a unitless entry cannot borrow digits from its value.
static VALUE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*•]\s*)?(?P<name>[^:]+?)\s*:\s*(?P<value>-?\d+(?:\.\d+)?)\s*(?P<unit>[^\s(\d.][^\s(]*)\s*\((?P<range>[^)]*)\)\s*(?P<status>.*)$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Values,
    Status,
    Recommendations,
}

impl Section {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "summary" => Some(Self::Summary),
            "test results" => Some(Self::Values),
            "status counts" => Some(Self::Status),
            "recommendations" => Some(Self::Recommendations),
            _ => None,
        }
    }
}

/// Located section bodies. The first occurrence of each label wins.
#[derive(Debug, Default)]
struct Sections<'a> {
    summary: Option<&'a str>,
    values: Option<&'a str>,
    status: Option<&'a str>,
    recommendations: Option<&'a str>,
}

/// Parse a semi-structured analysis report into a typed record.
///
/// Returns `None` unless the summary, test results and status counts are
/// all present; callers should then show the raw text instead.
pub fn parse_report(text: &str) -> Option<ReportRecord> {
    let sections = split_sections(text);

    let Some(summary) = sections.summary else {
        tracing::debug!("Report missing summary section");
        return None;
    };
    let Some(values) = sections.values else {
        tracing::debug!("Report missing test results section");
        return None;
    };
    let Some(status_counts) = parse_status_counts(sections.status.unwrap_or(text)) else {
        tracing::debug!("Report missing status count line");
        return None;
    };

    let values = parse_values(values);
    let parsed_total = values.len() as u32;
    let declared_total = status_counts.normal + status_counts.abnormal + status_counts.critical;
    if parsed_total != declared_total {
        tracing::debug!(
            parsed = parsed_total,
            declared = declared_total,
            "Report status counts differ from parsed rows"
        );
    }

    Some(ReportRecord {
        summary: strip_decorations(summary),
        status_counts,
        values,
        recommendations: sections
            .recommendations
            .map(parse_recommendations)
            .unwrap_or_default(),
    })
}

fn split_sections(text: &str) -> Sections<'_> {
    let labels: Vec<(Section, usize, usize)> = SECTION_LABEL
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let section = Section::from_label(cap.get(1)?.as_str())?;
            Some((section, whole.start(), whole.end()))
        })
        .collect();

    let mut sections = Sections::default();
    for (i, (section, _, body_start)) in labels.iter().enumerate() {
        let body_end = labels.get(i + 1).map(|(_, start, _)| *start).unwrap_or(text.len());
        let body = &text[*body_start..body_end];
        let slot = match section {
            Section::Summary => &mut sections.summary,
            Section::Values => &mut sections.values,
            Section::Status => &mut sections.status,
            Section::Recommendations => &mut sections.recommendations,
        };
        if slot.is_none() {
            *slot = Some(body);
        }
    }
    sections
}

fn parse_status_counts(text: &str) -> Option<StatusCounts> {
    let cap = STATUS_LINE.captures(text)?;
    Some(StatusCounts {
        normal: cap[1].parse().ok()?,
        abnormal: cap[2].parse().ok()?,
        critical: cap[3].parse().ok()?,
    })
}

/// Entries are separated by `|` or newlines; malformed entries are skipped.
fn parse_values(body: &str) -> Vec<ValueRow> {
    body.split(['|', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(parse_value_entry)
        .collect()
}

fn parse_value_entry(entry: &str) -> Option<ValueRow> {
    let cap = VALUE_ENTRY.captures(entry)?;
    let test_name = strip_decorations(&cap["name"]);
    if test_name.is_empty() {
        return None;
    }
    let status_text = &cap["status"];

    Some(ValueRow {
        test_name,
        value: cap["value"].parse().ok()?,
        unit: strip_decorations(&cap["unit"]),
        normal_range: strip_decorations(&cap["range"]),
        status: classify_status(status_text),
    })
}

fn parse_recommendations(body: &str) -> Recommendations {
    let labels: Vec<(String, usize, usize)> = RECOMMENDATION_LABEL
        .captures_iter(body)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some((cap.get(1)?.as_str().to_lowercase(), whole.start(), whole.end()))
        })
        .collect();

    let mut recommendations = Recommendations::default();
    for (i, (label, _, body_start)) in labels.iter().enumerate() {
        let body_end = labels.get(i + 1).map(|(_, start, _)| *start).unwrap_or(body.len());
        let text = strip_decorations(&body[*body_start..body_end]);
        let slot = if label == "lifestyle" {
            &mut recommendations.lifestyle
        } else if label.starts_with("follow") {
            &mut recommendations.follow_up
        } else {
            &mut recommendations.doctor
        };
        if slot.is_empty() {
            *slot = text;
        }
    }
    recommendations
}
