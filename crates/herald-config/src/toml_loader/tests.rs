//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use herald_common::ConfigError;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_herald_config.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[connection]
url = "wss://cms.example.edu/ws"
reconnect_delay_ms = 2000

[presence]
location = "admin-backups"
"##,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.connection.url, "wss://cms.example.edu/ws");
    assert_eq!(config.connection.reconnect_delay_ms, 2000);
    assert_eq!(config.presence.location, "admin-backups");
    // Defaults preserved
    assert_eq!(config.connection.settle_ms, 150);
    assert_eq!(config.connection.heartbeat_interval_ms, 4000);
    assert_eq!(config.notifications.tone.frequency_hz, 880.0);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let result = load_from_path(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn load_config_with_invalid_values_is_returned_as_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[connection]
missed_heartbeats = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.connection.missed_heartbeats, 0);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("herald").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.connection.url, "ws://localhost:8080/ws");
    assert_eq!(config.presence.location, "public");
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::HeraldConfig;

    let content = default_config_toml();
    let config: HeraldConfig = toml::from_str(&content).unwrap();
    assert!(crate::validation::validate(&config).is_ok());
    assert!(config.presence.client_id.is_none());
}

#[test]
fn default_config_path_is_reasonable() {
    // This may not work in all CI environments, but should work locally
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("herald"));
        assert!(path_str.ends_with("config.toml"));
    }
}
