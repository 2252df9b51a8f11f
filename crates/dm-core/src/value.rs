//! Helpers over actual JSON values

use serde_json::Value;

/// Longest rendering kept in a report line before truncation
const MAX_RENDER_CHARS: usize = 160;

/// Short name of the JSON kind of `value`
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a value for a report line, truncating long documents
pub fn render(value: &Value) -> String {
    truncate(value.to_string())
}

pub(crate) fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_RENDER_CHARS {
        return text;
    }
    let mut short: String = text.chars().take(MAX_RENDER_CHARS).collect();
    short.push('…');
    short
}

/// Zero value of its kind: `null`, `false`, `0`, `""`, `[]` or `{}`
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// `null`, or an empty string, array or object
pub fn is_empty(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(true),
        Value::String(s) => Some(s.is_empty()),
        Value::Array(a) => Some(a.is_empty()),
        Value::Object(o) => Some(o.is_empty()),
        Value::Bool(_) | Value::Number(_) => None,
    }
}

/// Length of a string (in chars), array or object
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        Value::Object(o) => Some(o.len()),
        _ => None,
    }
}
