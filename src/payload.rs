//! Tolerant decoding of step payloads.
//!
//! Functions exchange JSON, but the inspector must never fail because a
//! producer sent something else. [`decode`] is total: every byte string maps
//! to exactly one [`Payload`] variant.

use serde_json::{Map, Value};

/// A decoded request or response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No payload bytes were sent.
    Absent,
    /// A JSON object.
    Object(Map<String, Value>),
    /// A JSON array.
    Array(Vec<Value>),
    /// A JSON string, number, boolean or null.
    Scalar(Value),
    /// Bytes that were not valid JSON, kept as text.
    Opaque(String),
}

impl Payload {
    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }

    /// Structured view of the payload. Absent payloads become `null` and
    /// opaque payloads become a JSON string.
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Absent => Value::Null,
            Payload::Object(map) => Value::Object(map.clone()),
            Payload::Array(items) => Value::Array(items.clone()),
            Payload::Scalar(value) => value.clone(),
            Payload::Opaque(text) => Value::String(text.clone()),
        }
    }
}

/// Decode raw payload bytes.
pub fn decode(data: &[u8]) -> Payload {
    if data.is_empty() {
        return Payload::Absent;
    }
    match serde_json::from_slice::<Value>(data) {
        Ok(Value::Object(map)) => Payload::Object(map),
        Ok(Value::Array(items)) => Payload::Array(items),
        Ok(scalar) => Payload::Scalar(scalar),
        Err(_) => Payload::Opaque(String::from_utf8_lossy(data).into_owned()),
    }
}
