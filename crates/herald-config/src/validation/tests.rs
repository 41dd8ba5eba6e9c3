//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    let config = HeraldConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_non_websocket_url() {
    let mut config = HeraldConfig::default();
    config.connection.url = "http://localhost:8080".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("connection.url"));
}

#[test]
fn accepts_secure_websocket_url() {
    let mut config = HeraldConfig::default();
    config.connection.url = "wss://cms.example.edu/ws".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_settle_window_too_short() {
    let mut config = HeraldConfig::default();
    config.connection.settle_ms = 10;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("connection.settle_ms"));
}

#[test]
fn catches_heartbeat_interval_too_short() {
    let mut config = HeraldConfig::default();
    config.connection.heartbeat_interval_ms = 500;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("connection.heartbeat_interval_ms"));
}

#[test]
fn catches_missed_heartbeats_zero() {
    let mut config = HeraldConfig::default();
    config.connection.missed_heartbeats = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("connection.missed_heartbeats"));
}

#[test]
fn catches_reconnect_delay_too_large() {
    let mut config = HeraldConfig::default();
    config.connection.reconnect_delay_ms = 600_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("connection.reconnect_delay_ms"));
}

#[test]
fn catches_empty_location() {
    let mut config = HeraldConfig::default();
    config.presence.location = "   ".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("presence.location"));
}

#[test]
fn catches_blank_client_id() {
    let mut config = HeraldConfig::default();
    config.presence.client_id = Some(String::new());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("presence.client_id"));
}

#[test]
fn catches_empty_topic_name() {
    let mut config = HeraldConfig::default();
    config.presence.event_topics.push(String::new());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("presence.event_topics"));
}

#[test]
fn catches_tone_frequency_out_of_range() {
    let mut config = HeraldConfig::default();
    config.notifications.tone.frequency_hz = 5.0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("notifications.tone.frequency_hz"));
}

#[test]
fn catches_nan_gain() {
    let mut config = HeraldConfig::default();
    config.notifications.tone.gain = f64::NAN;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("notifications.tone.gain"));
}

#[test]
fn catches_display_capacity_zero() {
    let mut config = HeraldConfig::default();
    config.notifications.display_capacity = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("notifications.display_capacity"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = HeraldConfig::default();
    config.connection.settle_ms = 0;
    config.notifications.tone.gain = 2.0;
    config.notifications.display_ttl_secs = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("connection.settle_ms"));
    assert!(err.contains("notifications.tone.gain"));
    assert!(err.contains("notifications.display_ttl_secs"));
}
