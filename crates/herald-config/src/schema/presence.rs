//! Presence identity and topic configuration.

use serde::{Deserialize, Serialize};

/// Presence settings announced during registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Fixed client id. When unset a `visitor-xxxxxx` id is generated per run.
    pub client_id: Option<String>,
    /// Location announced on connect.
    pub location: String,
    /// Domain-event topics routed into the notification pipeline.
    pub event_topics: Vec<String>,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            location: "public".into(),
            event_topics: vec!["topic-backups".into(), "topic-notifications".into()],
        }
    }
}
