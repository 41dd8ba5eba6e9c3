//! Full configuration validation.
//!
//! Validates numeric ranges and the endpoint URL. Each section has its own
//! submodule; this orchestrator calls them all and collects errors into a
//! single `ConfigError`.

mod connection;
mod helpers;
mod notifications;

#[cfg(test)]
mod tests;

use crate::schema::HeraldConfig;
use herald_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HeraldConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    connection::validate_connection(&mut errors, config);
    connection::validate_presence(&mut errors, config);
    notifications::validate_notifications(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
