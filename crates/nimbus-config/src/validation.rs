// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and a
//! coherent model allowlist.

use crate::diagnostic::ConfigError;
use crate::model::NimbusConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &NimbusConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.auth.lockout_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.lockout_attempts must be at least 1".to_string(),
        });
    }

    if config.auth.lockout_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.lockout_minutes must be at least 1".to_string(),
        });
    }

    if config.auth.users_file.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "auth.users_file must not be empty".to_string(),
        });
    }

    if config.storage.conversations_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.conversations_dir must not be empty".to_string(),
        });
    }

    if config.storage.uploads_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.uploads_dir must not be empty".to_string(),
        });
    }

    if config.gemini.models.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gemini.models must list at least one model".to_string(),
        });
    }

    if !config.gemini.models.contains(&config.gemini.default_model) {
        errors.push(ConfigError::Validation {
            message: format!(
                "gemini.default_model `{}` is not in gemini.models",
                config.gemini.default_model
            ),
        });
    }

    if config.gemini.title_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gemini.title_model must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = NimbusConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_host_fails_validation() {
        let mut config = NimbusConfig::default();
        config.server.host = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("server.host"))
        ));
    }

    #[test]
    fn zero_lockout_attempts_fails_validation() {
        let mut config = NimbusConfig::default();
        config.auth.lockout_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("lockout_attempts"))
        ));
    }

    #[test]
    fn default_model_outside_allowlist_fails_validation() {
        let mut config = NimbusConfig::default();
        config.gemini.default_model = "gemini-experimental".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("default_model"))
        ));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = NimbusConfig::default();
        config.server.host = "".to_string();
        config.storage.conversations_dir = "".to_string();
        config.gemini.models = Vec::new();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
