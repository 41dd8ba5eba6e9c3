//! Validation for the connection and presence sections.

use crate::schema::HeraldConfig;

use super::helpers::validate_range;

/// Validate connection constraints.
pub(crate) fn validate_connection(errors: &mut Vec<String>, config: &HeraldConfig) {
    let conn = &config.connection;

    if !(conn.url.starts_with("ws://") || conn.url.starts_with("wss://")) {
        errors.push(format!(
            "connection.url = {:?} must start with ws:// or wss://",
            conn.url
        ));
    }

    validate_range(
        errors,
        "connection.connect_timeout_ms",
        conn.connect_timeout_ms,
        1_000,
        60_000,
    );
    validate_range(errors, "connection.settle_ms", conn.settle_ms, 50, 5_000);
    validate_range(
        errors,
        "connection.heartbeat_interval_ms",
        conn.heartbeat_interval_ms,
        1_000,
        60_000,
    );
    validate_range(
        errors,
        "connection.missed_heartbeats",
        u64::from(conn.missed_heartbeats),
        1,
        10,
    );
    validate_range(
        errors,
        "connection.reconnect_delay_ms",
        conn.reconnect_delay_ms,
        100,
        300_000,
    );
}

/// Validate presence constraints.
pub(crate) fn validate_presence(errors: &mut Vec<String>, config: &HeraldConfig) {
    let presence = &config.presence;

    if presence.location.trim().is_empty() {
        errors.push("presence.location must not be empty".to_string());
    }
    if let Some(id) = &presence.client_id {
        if id.trim().is_empty() {
            errors.push("presence.client_id must not be empty when set".to_string());
        }
    }
    if presence.event_topics.iter().any(|t| t.trim().is_empty()) {
        errors.push("presence.event_topics must not contain empty names".to_string());
    }
}
