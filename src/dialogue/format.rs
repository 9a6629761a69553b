use crate::models::DiagnosisRecord;

const DISCLAIMER: &str =
    "This analysis is informational only and does not replace a consultation with a doctor.";

/// Render diagnosis records as a transcript entry.
pub fn format_diagnosis(results: &[DiagnosisRecord]) -> String {
    if results.is_empty() {
        return format!(
            "No matching conditions were found for the symptoms you described.\n\n{DISCLAIMER}"
        );
    }

    let mut out = String::from("Possible conditions based on your answers:\n");
    for (i, record) in results.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {}\n   Confidence: {}% | Severity: {} | Symptom coverage: {}%",
            i + 1,
            record.disease,
            record.confidence,
            record.severity,
            record.symptom_coverage,
        ));
        if !record.key_symptoms.is_empty() {
            out.push_str(&format!(
                "\n   Key symptoms: {}",
                record.key_symptoms.join(", ")
            ));
        }
        out.push('\n');
    }
    out.push('\n');
    out.push_str(DISCLAIMER);
    out
}
