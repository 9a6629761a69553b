use serde::{Deserialize, Serialize};

use super::enums::ValueStatus;

/// Typed view of a semi-structured analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub summary: String,
    pub status_counts: StatusCounts,
    pub values: Vec<ValueRow>,
    pub recommendations: Recommendations,
}

/// Counts exactly as declared by the report's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub normal: u32,
    pub abnormal: u32,
    pub critical: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub normal_range: String,
    pub status: ValueStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recommendations {
    pub lifestyle: String,
    pub follow_up: String,
    pub doctor: String,
}

impl ReportRecord {
    /// Rows belonging to one status group, in report order.
    pub fn grouped(&self, status: ValueStatus) -> Vec<&ValueRow> {
        self.values.iter().filter(|v| v.status == status).collect()
    }
}
