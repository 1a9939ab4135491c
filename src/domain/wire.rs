use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("payload must be a JSON object")]
    InvalidPayloadType,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {field} is not an integer: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("field {field} must be a JSON {expected}")]
    UnexpectedType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("duration in {0} is out of range")]
    DurationOutOfRange(&'static str),
}

pub(crate) fn as_object<'a>(
    value: &'a Value,
    field: &'static str,
) -> Result<&'a Map<String, Value>, DecodeError> {
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(DecodeError::UnexpectedType {
            field,
            expected: "object",
        }),
    }
}

pub(crate) fn require_object<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Map<String, Value>, DecodeError> {
    find_value(object, key)
        .ok_or(DecodeError::MissingField(key))
        .and_then(|value| as_object(value, key))
}

pub(crate) fn require_i64(object: &Map<String, Value>, key: &'static str) -> Result<i64, DecodeError> {
    let value = find_value(object, key).ok_or(DecodeError::MissingField(key))?;
    parse_i64(value, key)
}

/// Absent fields and empty strings decode to `None`; anything else must be an integer.
pub(crate) fn optional_i64(
    object: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<i64>, DecodeError> {
    match find_value(object, key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => parse_i64(value, key).map(Some),
    }
}

pub(crate) fn require_str<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, DecodeError> {
    match find_value(object, key) {
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(_) => Err(DecodeError::UnexpectedType {
            field: key,
            expected: "string",
        }),
        None => Err(DecodeError::MissingField(key)),
    }
}

pub(crate) fn optional_str<'a>(object: &'a Map<String, Value>, key: &'static str) -> Option<&'a str> {
    find_value(object, key).and_then(Value::as_str)
}

/// The service sends most numbers as numeric strings; native JSON integers are accepted too.
fn parse_i64(value: &Value, field: &'static str) -> Result<i64, DecodeError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| DecodeError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Looks up `key` exactly first, then ignoring case and punctuation.
pub(crate) fn find_value<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = object.get(key) {
        return Some(value);
    }

    let normalized = normalize_key(key);
    object
        .iter()
        .find_map(|(candidate, value)| (normalize_key(candidate) == normalized).then_some(value))
}

fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|char| char.is_ascii_alphanumeric())
        .flat_map(|char| char.to_lowercase())
        .collect()
}
