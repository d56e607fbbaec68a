//! Textual coercion helpers shared by both source readers.
//!
//! Raw data sets carry dates and numbers as text (source B throughout,
//! source A for some exports), so both readers funnel field conversion
//! through here. A failed coercion is a hard error for the whole fetch,
//! never a per-record skip.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// A single field that could not be converted to its typed form.
#[derive(Debug, Error)]
#[error("field `{field}`: cannot coerce {value:?} ({reason})")]
pub struct CoerceError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl CoerceError {
    fn new(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Parse an ISO-8601-like timestamp.
///
/// Accepted, in order of preference:
/// - RFC 3339 with offset or `Z` suffix (`2024-01-15T10:30:00Z`)
/// - naive timestamp, assumed UTC (`2024-01-15T10:30:00`, optional fraction)
/// - bare date, midnight UTC (`2024-01-15`)
pub fn parse_order_date(field: &'static str, raw: &str) -> Result<DateTime<Utc>, CoerceError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(CoerceError::new(field, raw, "not an ISO-8601 date"))
}

/// Integer from a textual value.
pub fn parse_i64_str(field: &'static str, raw: &str) -> Result<i64, CoerceError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| CoerceError::new(field, raw, e.to_string()))
}

/// Float from a textual value.
pub fn parse_f64_str(field: &'static str, raw: &str) -> Result<f64, CoerceError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| CoerceError::new(field, raw, e.to_string()))
}

/// Integer from a JSON value that may be a number or a numeric string.
pub fn parse_i64(field: &'static str, raw: &Value) -> Result<i64, CoerceError> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CoerceError::new(field, n.to_string(), "not an integer")),
        Value::String(s) => parse_i64_str(field, s),
        other => Err(CoerceError::new(field, other.to_string(), "not a number")),
    }
}

/// Float from a JSON value that may be a number or a numeric string.
pub fn parse_f64(field: &'static str, raw: &Value) -> Result<f64, CoerceError> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoerceError::new(field, n.to_string(), "not a float")),
        Value::String(s) => parse_f64_str(field, s),
        other => Err(CoerceError::new(field, other.to_string(), "not a number")),
    }
}

/// Source-specific payloads arrive either as structured JSON or as a
/// JSON-encoded string (the raw exports store them as text). Decode the
/// text form when possible; an undecodable string is kept verbatim rather
/// than rejected; the payload is free-form by contract.
pub fn normalize_payload(raw: Value) -> Value {
    match raw {
        Value::String(text) => {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        other => other,
    }
}
