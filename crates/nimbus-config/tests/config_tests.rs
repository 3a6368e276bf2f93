// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Nimbus configuration system.

use nimbus_config::diagnostic::ConfigError;
use nimbus_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_nimbus_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[auth]
lockout_attempts = 3
lockout_minutes = 30
default_admin_username = "root"
default_admin_password = "s3cret"
users_file = "/var/lib/nimbus/users.json"

[storage]
conversations_dir = "/var/lib/nimbus/conversations"
uploads_dir = "/var/lib/nimbus/uploads"

[gemini]
api_keys = ["key-a", "key-b"]
default_model = "gemini-2.5-pro"
models = ["gemini-2.5-flash", "gemini-2.5-pro"]
title_model = "gemini-2.5-flash-lite-preview-06-17"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.auth.lockout_attempts, 3);
    assert_eq!(config.auth.lockout_minutes, 30);
    assert_eq!(config.auth.default_admin_username, "root");
    assert_eq!(config.auth.users_file, "/var/lib/nimbus/users.json");
    assert_eq!(config.storage.conversations_dir, "/var/lib/nimbus/conversations");
    assert_eq!(config.storage.uploads_dir, "/var/lib/nimbus/uploads");
    assert_eq!(config.gemini.api_keys, vec!["key-a", "key-b"]);
    assert_eq!(config.gemini.default_model, "gemini-2.5-pro");
}

/// Unknown field in a section produces an error mentioning the bad key.
#[test]
fn unknown_field_produces_error() {
    let toml = r#"
[server]
prot = 8080
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 5001);
    assert_eq!(config.server.log_level, "info");
    assert_eq!(config.auth.lockout_attempts, 5);
    assert_eq!(config.auth.lockout_minutes, 15);
    assert_eq!(config.auth.default_admin_username, "admin");
    assert!(config.gemini.api_keys.is_empty());
    assert!(config.gemini.api_keys_file.is_none());
    assert_eq!(config.gemini.default_model, "gemini-2.5-flash");
    assert_eq!(
        config.gemini.models,
        vec!["gemini-2.5-flash", "gemini-2.5-pro"]
    );
}

/// Validation errors surface through load_and_validate_str as diagnostics.
#[test]
fn semantic_validation_errors_are_collected() {
    let toml = r#"
[auth]
lockout_attempts = 0

[gemini]
default_model = "not-in-list"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors.len() >= 2);
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

/// A typo in a known section gets a "did you mean" suggestion.
#[test]
fn typo_gets_suggestion_through_validate_entry_point() {
    let toml = r#"
[gemini]
defalt_model = "gemini-2.5-flash"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { suggestion, .. }
            if suggestion.as_deref() == Some("default_model")
    )));
}
