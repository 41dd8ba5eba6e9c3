//! Decoding of untyped frame bodies.
//!
//! Bodies arrive as plain text. They are interpreted once, in order:
//! structured JSON (object or array), then a numeric scalar, then the raw
//! string. Listeners receive the first interpretation that succeeds.

use std::borrow::Cow;

use serde_json::Value;

/// A decoded frame body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(Value),
    Numeric(f64),
    Raw(String),
}

impl Payload {
    pub fn decode(body: &str) -> Self {
        let trimmed = body.trim();

        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                return Payload::Structured(value);
            }
        }

        if let Ok(number) = trimmed.parse::<f64>() {
            if number.is_finite() {
                return Payload::Numeric(number);
            }
        }

        // A JSON string literal carries its text unquoted.
        if trimmed.starts_with('"') {
            if let Ok(Value::String(text)) = serde_json::from_str::<Value>(trimmed) {
                return Payload::Raw(text);
            }
        }

        Payload::Raw(body.to_string())
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Payload::Structured(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Payload::Numeric(number) => Some(*number),
            _ => None,
        }
    }

    /// String field of a structured object payload.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.as_structured()?.get(key)?.as_str()
    }

    /// Human-readable text of the payload.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Payload::Raw(text) => Cow::Borrowed(text),
            Payload::Numeric(number) => Cow::Owned(number.to_string()),
            Payload::Structured(value) => Cow::Owned(value.to_string()),
        }
    }
}
