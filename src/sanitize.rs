use serde_json::Value;

use crate::store::Submission;

/// Sanitize a submission before it is persisted
///
/// Every string value has its `"` characters doubled and its `,` characters
/// replaced with `\,`. Non-string values pass through unchanged. This runs
/// once, at submission time; the CSV exporter applies its own quoting on top
/// of the stored values (see `export::quote`), so quotes end up escaped
/// twice in exported documents. The two steps are kept as separate functions
/// on purpose.
///
/// # Arguments
/// * `submission` - The validated submission to sanitize
///
/// # Returns
/// * `Submission` - A new mapping with sanitized string values
pub fn sanitize(submission: Submission) -> Submission {
    submission
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, Value::String(sanitize_value(&s))),
            other => (key, other),
        })
        .collect()
}

/// Escape a single string value for storage
pub fn sanitize_value(value: &str) -> String {
    value.replace('"', "\"\"").replace(',', "\\,")
}
