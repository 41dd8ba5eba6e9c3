//! Domain events and their classification.
//!
//! An explicit `kind`, `type`, or `status` field in a structured payload
//! decides the kind when it holds a recognized label. Otherwise the event
//! text is searched, case-insensitively, for success keywords first and
//! error keywords second. Everything else is `Info`; nothing is dropped.

use herald_common::EventId;
use herald_realtime::{Delivery, Payload};
use serde_json::Value;

const SUCCESS_KEYWORDS: &[&str] = &["success", "completed", "completado", "exitosamente", "exitoso"];
const ERROR_KEYWORDS: &[&str] = &["error", "failed", "fallido"];

/// Fields consulted, in order, for an explicit kind.
const KIND_FIELDS: &[&str] = &["kind", "type", "status"];

/// Fields that carry human-readable text in structured payloads.
const TEXT_FIELDS: &[&str] = &["title", "message", "body", "text", "description", "detail"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Success,
    Error,
    Info,
}

impl EventKind {
    /// Map an explicit label such as `"success"` or `"error"`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "success" | "succeeded" | "ok" | "completed" | "done" => Some(Self::Success),
            "error" | "failed" | "failure" | "fatal" => Some(Self::Error),
            "info" | "information" | "notice" | "warning" | "pending" => Some(Self::Info),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide the kind of an event payload.
pub fn classify(payload: &Payload) -> EventKind {
    if let Some(kind) = explicit_kind(payload) {
        return kind;
    }
    classify_text(&event_text(payload))
}

/// Keyword heuristic over free text. Success keywords win over error keywords.
pub fn classify_text(text: &str) -> EventKind {
    let lowered = text.to_lowercase();
    if SUCCESS_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        EventKind::Success
    } else if ERROR_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        EventKind::Error
    } else {
        EventKind::Info
    }
}

fn explicit_kind(payload: &Payload) -> Option<EventKind> {
    let object = payload.as_structured()?.as_object()?;
    KIND_FIELDS
        .iter()
        .filter_map(|field| object.get(*field)?.as_str())
        .find_map(EventKind::from_label)
}

/// Text that describes the event, for classification and display.
pub(crate) fn event_text(payload: &Payload) -> String {
    let Some(Value::Object(object)) = payload.as_structured() else {
        return payload.text().into_owned();
    };
    let parts: Vec<&str> = TEXT_FIELDS
        .iter()
        .filter_map(|field| object.get(*field)?.as_str())
        .collect();
    if parts.is_empty() {
        payload.text().into_owned()
    } else {
        parts.join(" ")
    }
}

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// One classified event received on a subscribed topic.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub payload: Payload,
    pub source_topic: String,
}

impl DomainEvent {
    pub fn new(payload: Payload, source_topic: impl Into<String>) -> Self {
        let id = payload_id(&payload).unwrap_or_default();
        Self {
            id,
            kind: classify(&payload),
            payload,
            source_topic: source_topic.into(),
        }
    }

    pub fn from_delivery(delivery: Delivery) -> Self {
        Self::new(delivery.payload, delivery.topic)
    }

    /// String field of a structured payload.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload.str_field(key)
    }
}

/// Server-supplied event id, string or integer.
fn payload_id(payload: &Payload) -> Option<EventId> {
    match payload.as_structured()?.get("id")? {
        Value::String(id) if !id.is_empty() => Some(EventId::from(id.as_str())),
        Value::Number(id) => Some(EventId::from(id.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(body: &str) -> EventKind {
        classify(&Payload::decode(body))
    }

    #[test]
    fn spanish_success_message() {
        assert_eq!(kind_of("Backup completado exitosamente"), EventKind::Success);
        assert_eq!(kind_of("Proceso exitoso"), EventKind::Success);
    }

    #[test]
    fn error_keywords() {
        assert_eq!(kind_of("Backup FAILED at 03:00"), EventKind::Error);
        assert_eq!(kind_of("Respaldo fallido"), EventKind::Error);
        assert_eq!(kind_of("disk error"), EventKind::Error);
    }

    #[test]
    fn success_checked_before_error() {
        assert_eq!(
            kind_of("completed with error count 0"),
            EventKind::Success
        );
    }

    #[test]
    fn anything_else_is_info() {
        assert_eq!(kind_of("New comment on page"), EventKind::Info);
        assert_eq!(kind_of("42"), EventKind::Info);
        assert_eq!(kind_of(""), EventKind::Info);
    }

    #[test]
    fn explicit_field_wins_over_text() {
        assert_eq!(
            kind_of(r#"{"status":"error","message":"Backup completado"}"#),
            EventKind::Error
        );
        assert_eq!(
            kind_of(r#"{"type":"success","message":"3 files failed to sync"}"#),
            EventKind::Success
        );
        assert_eq!(
            kind_of(r#"{"kind":"info","message":"failed"}"#),
            EventKind::Info
        );
    }

    #[test]
    fn unrecognized_label_falls_back_to_text() {
        assert_eq!(
            kind_of(r#"{"type":"backup","message":"Backup failed"}"#),
            EventKind::Error
        );
    }

    #[test]
    fn structured_text_ignores_key_names() {
        // "error" only appears as a key, not in the message.
        assert_eq!(
            kind_of(r#"{"message":"Page published","error":null}"#),
            EventKind::Info
        );
    }

    #[test]
    fn event_id_comes_from_payload() {
        let event = DomainEvent::new(
            Payload::decode(r#"{"id":"bk-17","message":"done"}"#),
            "topic-backups",
        );
        assert_eq!(event.id.as_str(), "bk-17");

        let event = DomainEvent::new(Payload::decode(r#"{"id":99}"#), "topic-backups");
        assert_eq!(event.id.as_str(), "99");
    }

    #[test]
    fn event_id_generated_when_absent() {
        let a = DomainEvent::new(Payload::decode("hello"), "topic-x");
        let b = DomainEvent::new(Payload::decode("hello"), "topic-x");
        assert_ne!(a.id, b.id);
        assert_eq!(a.source_topic, "topic-x");
    }
}
