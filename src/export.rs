use serde_json::Value;

use crate::store::Submission;

/// Leading characters a spreadsheet would interpret as a formula.
const FORMULA_TRIGGERS: [char; 4] = ['=', '+', '-', '@'];

/// Render a day's records as a CSV document
///
/// The header row is `timestamp` followed by the keys of the first record in
/// insertion order (excluding `timestamp` itself); every row is projected
/// onto that header, with absent columns rendered as empty fields. Callers
/// must pass a non-empty slice; the store reports `NotFound`/`Empty` first.
///
/// # Arguments
/// * `records` - The day's submissions, in file order
///
/// # Returns
/// * `String` - The CSV document, rows joined with newlines
pub fn to_csv(records: &[Submission]) -> String {
    let mut columns: Vec<&str> = vec!["timestamp"];
    columns.extend(records[0].keys().map(String::as_str).filter(|k| *k != "timestamp"));

    let mut out = columns.join(",");
    for record in records {
        out.push('\n');
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&quote(&guard_formula(&field_text(record.get(*column)))));
        }
    }
    out
}

/// Render one stored value as CSV field text
///
/// Absent columns become empty fields; strings are used as-is (already
/// sanitized at store time); anything else renders as its JSON text.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Prefix values that would trigger formula evaluation with a literal `'`
///
/// Runs before quoting, so the guard character ends up inside the quotes.
fn guard_formula(value: &str) -> String {
    match value.chars().next() {
        Some(c) if FORMULA_TRIGGERS.contains(&c) => format!("'{}", value),
        _ => value.to_string(),
    }
}

/// Wrap a field in double quotes, doubling any internal quote
///
/// Independent of the store-time sanitizer: stored values already carry
/// doubled quotes, and this doubles them again on export.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Submission {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn header_comes_from_the_first_record() {
        let records = vec![
            record(&[("timestamp", json!("T1")), ("a", json!("1")), ("b", json!("2"))]),
            record(&[("timestamp", json!("T2")), ("a", json!("3"))]),
        ];

        let csv = to_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,a,b");
        assert_eq!(lines[1], r#""T1","1","2""#);
        // Second record has no `b`; it renders as an empty field.
        assert_eq!(lines[2], r#""T2","3","""#);
    }

    #[test]
    fn columns_absent_from_later_records_do_not_widen_the_header() {
        let records = vec![
            record(&[("timestamp", json!("T1")), ("a", json!("1"))]),
            record(&[("timestamp", json!("T2")), ("a", json!("2")), ("extra", json!("x"))]),
        ];
        assert_eq!(to_csv(&records).lines().next().unwrap(), "timestamp,a");
    }

    #[test]
    fn formula_triggers_get_a_quote_prefix() {
        let records = vec![record(&[("timestamp", json!("T1")), ("a", json!("=1+1"))])];
        let csv = to_csv(&records);
        assert!(csv.ends_with(r#""T1","'=1+1""#));

        for value in ["+5", "-5", "@cmd"] {
            let records = vec![record(&[("timestamp", json!("T")), ("a", json!(value))])];
            assert!(to_csv(&records).contains(&format!("\"'{}\"", value)));
        }
    }

    #[test]
    fn quotes_are_doubled_on_export() {
        // Stored values already carry doubled quotes from the sanitizer;
        // export doubles them again.
        let records = vec![record(&[("timestamp", json!("T1")), ("a", json!(r#"he said ""hi"""#))])];
        let csv = to_csv(&records);
        assert!(csv.contains(r#""he said """"hi""""""#));
    }

    #[test]
    fn non_string_values_render_as_json_text() {
        let records = vec![record(&[
            ("timestamp", json!("T1")),
            ("sources", json!(["radio", "tv"])),
        ])];
        let csv = to_csv(&records);
        assert!(csv.contains(r#""[""radio"",""tv""]""#));
    }
}
