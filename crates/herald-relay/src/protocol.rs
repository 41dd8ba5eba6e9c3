//! Relay-side helpers over the shared wire protocol.

use std::collections::BTreeMap;

use herald_realtime::protocol::{destinations, Frame};
use serde::{Deserialize, Serialize};

/// Body published on the presence topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceCounts {
    pub total: u64,
    pub by_location: BTreeMap<String, u64>,
}

impl PresenceCounts {
    pub fn to_frame(&self) -> Option<Frame> {
        let body = serde_json::to_string(self).ok()?;
        Some(Frame::message(destinations::PRESENCE_COUNTS, body))
    }
}

/// Destinations clients may publish to and subscribe on.
pub fn is_topic(destination: &str) -> bool {
    destination.starts_with("topic-") && destination.len() > "topic-".len()
}

/// Topics only the relay itself writes.
pub fn is_server_owned(destination: &str) -> bool {
    destination == destinations::PRESENCE_COUNTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_serialize_camel_case() {
        let mut counts = PresenceCounts::default();
        counts.total = 2;
        counts.by_location.insert("public".into(), 2);
        let frame = counts.to_frame().unwrap();
        assert_eq!(frame.destination.as_deref(), Some(destinations::PRESENCE_COUNTS));
        assert_eq!(
            frame.body.as_deref(),
            Some(r#"{"total":2,"byLocation":{"public":2}}"#)
        );
    }

    #[test]
    fn topic_names() {
        assert!(is_topic("topic-backups"));
        assert!(!is_topic("topic-"));
        assert!(!is_topic("app-registration"));
        assert!(is_server_owned(destinations::PRESENCE_COUNTS));
        assert!(!is_server_owned("topic-backups"));
    }
}
