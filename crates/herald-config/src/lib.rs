//! Herald configuration system.
//!
//! Provides TOML-based configuration with full validation and the
//! persisted realtime-notification preference. All config sections use
//! sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use herald_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("broker: {}", config.connection.url);
//! ```

pub mod preference;
pub mod schema;
pub mod toml_loader;
pub mod validation;

// Re-export core types for convenience
pub use preference::PreferenceStore;
pub use schema::HeraldConfig;

use herald_common::ConfigError;
use std::path::Path;

/// Convenience function to load config from the platform default path.
///
/// Loads `config.toml` from the OS config directory, creates a default
/// if none exists, and validates the result.
pub fn load_config() -> Result<HeraldConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load and validate config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<HeraldConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection]\nsettle_ms = 1\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_config_from_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[presence]\nlocation = \"admin\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.presence.location, "admin");
        assert_eq!(config.connection.reconnect_delay_ms, 5000);
        assert_eq!(config.connection.heartbeat_interval_ms, 4000);
    }

    #[test]
    fn logging_directive_uses_level() {
        let mut config = HeraldConfig::default();
        assert_eq!(config.logging.directive("herald"), "herald=info");
        config.logging.level = schema::LogLevel::Debug;
        assert_eq!(config.logging.directive("herald"), "herald=debug");
    }
}
