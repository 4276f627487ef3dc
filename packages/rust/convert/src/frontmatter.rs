//! Frontmatter generation from configured field mappings.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use kantanpress_shared::{FieldFormat, FrontmatterField, KantanError, Record, Result};

/// Apply a configured formatter to a field value.
///
/// `iso-date` accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date and
/// emits the date part. Other values pass through unchanged.
pub fn format_value(value: &Value, format: Option<FieldFormat>) -> Result<Value> {
    match format {
        None => Ok(value.clone()),
        Some(FieldFormat::IsoDate) => {
            let raw = value.as_str().ok_or_else(|| {
                KantanError::validation(format!("iso-date formatter expects a string, got {value}"))
            })?;
            Ok(Value::String(format_iso_date(raw)?))
        }
    }
}

fn format_iso_date(raw: &str) -> Result<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    Err(KantanError::validation(format!(
        "cannot parse '{raw}' as an ISO date"
    )))
}

/// Generate a frontmatter block for a record.
///
/// One `target: value` line per configured field. A field is emitted when
/// the source value is present and neither null nor empty; `required` fields
/// fall back to `target: ""`. The returned block ends with `---\n`.
pub fn generate_frontmatter(record: &Record, fields: &[FrontmatterField]) -> Result<String> {
    let mut lines = vec!["---".to_string()];

    for field in fields {
        match record.get(&field.source) {
            Some(value) if record.has_value(&field.source) => {
                let formatted = format_value(&value, field.format)?;
                lines.push(format!("{}: {}", field.target, yaml_scalar(&formatted)));
            }
            _ if field.required => lines.push(format!("{}: \"\"", field.target)),
            _ => {}
        }
    }

    lines.push("---".to_string());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

/// Render a JSON value as a YAML scalar. Strings are double-quoted.
fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", escape_yaml_string(s)),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => format!("\"{}\"", escape_yaml_string(&other.to_string())),
    }
}

/// Escape special characters in a YAML string value.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
