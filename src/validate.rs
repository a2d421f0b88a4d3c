use serde_json::Value;

use crate::schema::FieldSchema;
use crate::store::Submission;

/// Check a submission against the required field schema
///
/// Returns the schema fields that are absent or empty, in schema order. An
/// empty result means the submission is valid. Fields not listed in the
/// schema (e.g. optional multi-select groups) are never checked.
///
/// # Arguments
/// * `schema` - The active field schema
/// * `submission` - Candidate submission, field name to value
///
/// # Returns
/// * `Vec<&'static str>` - Missing required field names, in schema order
pub fn missing_fields(schema: &FieldSchema, submission: &Submission) -> Vec<&'static str> {
    schema
        .required_fields()
        .iter()
        .filter(|name| !is_present(submission.get(**name)))
        .copied()
        .collect()
}

/// A value counts as present when it is a non-empty string, or a repeated
/// form entry (array) with at least one non-empty element.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(entries)) => entries.iter().any(|entry| match entry {
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        }),
        Some(_) => true,
    }
}
