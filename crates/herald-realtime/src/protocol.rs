//! Wire protocol for the presence bus.
//!
//! Every message is one JSON text frame. Frames are addressed by a
//! destination string; bodies are opaque text that the subscription
//! registry decodes (see `payload`).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Well-known destinations
// ---------------------------------------------------------------------------

/// Destinations with a fixed meaning in the presence protocol.
pub mod destinations {
    /// Client → server: `{clientId, location}` on every (re)connect.
    pub const REGISTRATION: &str = "app-registration";
    /// Client → server: `{location}` when the user moves to another section.
    pub const LOCATION_UPDATE: &str = "app-location-update";
    /// Server → client: aggregate presence counts.
    pub const PRESENCE_COUNTS: &str = "topic-presence-counts";
}

// ---------------------------------------------------------------------------
// Ref Counter
// ---------------------------------------------------------------------------

/// Monotonically increasing ref counter for frames that expect a reply.
static REF_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn next_ref() -> String {
    REF_COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

// ---------------------------------------------------------------------------
// Frame envelope
// ---------------------------------------------------------------------------

/// Frame command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Client publishes a body to a destination.
    Send,
    Subscribe,
    Unsubscribe,
    /// Server delivers a body published on a topic.
    Message,
    Heartbeat,
    /// Server accepts the frame carrying the same `ref`.
    Ack,
    /// Server rejects the frame carrying the same `ref`, or reports a
    /// session-level problem when `ref` is absent.
    Error,
}

/// A protocol frame (JSON envelope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub command: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub frame_ref: Option<String>,
}

impl Frame {
    fn new(command: Command) -> Self {
        Self {
            command,
            destination: None,
            body: None,
            frame_ref: None,
        }
    }

    pub fn send(destination: &str, body: impl Into<String>) -> Self {
        Self {
            destination: Some(destination.to_string()),
            body: Some(body.into()),
            ..Self::new(Command::Send)
        }
    }

    pub fn subscribe(destination: &str) -> Self {
        Self {
            destination: Some(destination.to_string()),
            ..Self::new(Command::Subscribe)
        }
    }

    pub fn unsubscribe(destination: &str) -> Self {
        Self {
            destination: Some(destination.to_string()),
            ..Self::new(Command::Unsubscribe)
        }
    }

    pub fn message(destination: &str, body: impl Into<String>) -> Self {
        Self {
            destination: Some(destination.to_string()),
            body: Some(body.into()),
            ..Self::new(Command::Message)
        }
    }

    pub fn heartbeat() -> Self {
        Self::new(Command::Heartbeat)
    }

    pub fn ack(frame_ref: Option<String>) -> Self {
        Self {
            frame_ref,
            ..Self::new(Command::Ack)
        }
    }

    pub fn error(frame_ref: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            frame_ref,
            body: Some(reason.into()),
            ..Self::new(Command::Error)
        }
    }

    pub fn with_ref(mut self, frame_ref: impl Into<String>) -> Self {
        self.frame_ref = Some(frame_ref.into());
        self
    }

    /// Serialize to the JSON text sent over the transport.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// Presence bodies
// ---------------------------------------------------------------------------

/// Body of the registration frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub client_id: String,
    pub location: String,
}

/// Body of a location update frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_are_unique_and_increasing() {
        let a: u64 = next_ref().parse().unwrap();
        let b: u64 = next_ref().parse().unwrap();
        assert!(b > a);
    }

    #[test]
    fn send_frame_wire_shape() {
        let frame = Frame::send(destinations::LOCATION_UPDATE, r#"{"location":"admin"}"#)
            .with_ref("7");
        let json: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(json["command"], "send");
        assert_eq!(json["destination"], "app-location-update");
        assert_eq!(json["body"], r#"{"location":"admin"}"#);
        assert_eq!(json["ref"], "7");
    }

    #[test]
    fn heartbeat_omits_empty_fields() {
        let text = Frame::heartbeat().encode().unwrap();
        assert_eq!(text, r#"{"command":"heartbeat"}"#);
    }

    #[test]
    fn decodes_server_message_without_ref() {
        let frame =
            Frame::decode(r#"{"command":"message","destination":"topic-x","body":"42"}"#).unwrap();
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.destination.as_deref(), Some("topic-x"));
        assert_eq!(frame.body.as_deref(), Some("42"));
        assert!(frame.frame_ref.is_none());
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(Frame::decode(r#"{"command":"teleport"}"#).is_err());
    }

    #[test]
    fn registration_uses_camel_case() {
        let body = serde_json::to_string(&Registration {
            client_id: "visitor-ab12cd".into(),
            location: "public".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"clientId":"visitor-ab12cd","location":"public"}"#);
    }
}
