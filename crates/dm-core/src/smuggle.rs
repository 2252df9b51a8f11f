//! Built-in smugglers

use chrono::DateTime;
use serde_json::Value;

use crate::ops;
use crate::pattern::Pattern;

/// Parse an RFC 3339 timestamp string into Unix milliseconds.
///
/// The zero instant (`0001-01-01T00:00:00Z`) is rejected, since it usually
/// means a timestamp was never set.
pub fn parse_rfc3339_millis(value: &Value) -> Result<Value, String> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("RFC 3339 string expected, got {}", value))?;
    let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| format!("{}: {}", text, e))?;
    if parsed.timestamp() == ZERO_TIME_SECS {
        return Err("zero time".to_string());
    }
    Ok(Value::from(parsed.timestamp_millis()))
}

/// Seconds of `0001-01-01T00:00:00Z` relative to the Unix epoch
const ZERO_TIME_SECS: i64 = -62_135_596_800;

/// Match an RFC 3339 timestamp through its Unix milliseconds
///
/// ```ignore
/// let after_start = rfc3339_millis(ops::gte(start.timestamp_millis()));
/// ```
pub fn rfc3339_millis(expected: impl Into<Pattern>) -> Pattern {
    ops::smuggle("rfc3339_millis", parse_rfc3339_millis, expected)
}
