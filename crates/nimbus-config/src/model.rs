// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Nimbus chat server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Nimbus configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NimbusConfig {
    /// HTTP server bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Login and lockout policy.
    #[serde(default)]
    pub auth: AuthConfig,

    /// On-disk data locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Login and account-lockout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Failed attempts before an account is locked.
    #[serde(default = "default_lockout_attempts")]
    pub lockout_attempts: u32,

    /// Lockout duration in minutes.
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: u32,

    /// Username seeded when the users file has no users.
    #[serde(default = "default_admin_username")]
    pub default_admin_username: String,

    /// Password for the seeded admin (hashed on first run).
    #[serde(default = "default_admin_password")]
    pub default_admin_password: String,

    /// Path of the JSON users file.
    #[serde(default = "default_users_file")]
    pub users_file: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            lockout_attempts: default_lockout_attempts(),
            lockout_minutes: default_lockout_minutes(),
            default_admin_username: default_admin_username(),
            default_admin_password: default_admin_password(),
            users_file: default_users_file(),
        }
    }
}

fn default_lockout_attempts() -> u32 {
    5
}

fn default_lockout_minutes() -> u32 {
    15
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "changeme".to_string()
}

fn default_users_file() -> String {
    "users.json".to_string()
}

/// On-disk data locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding one JSON file per conversation.
    #[serde(default = "default_conversations_dir")]
    pub conversations_dir: String,

    /// Directory holding uploaded attachment bytes.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            conversations_dir: default_conversations_dir(),
            uploads_dir: default_uploads_dir(),
        }
    }
}

fn default_conversations_dir() -> String {
    "conversations".to_string()
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Inline API keys. When empty, `api_keys_file` (or
    /// `~/.gemini_chat_keys`) is consulted instead.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Path of a file holding one API key per line.
    #[serde(default)]
    pub api_keys_file: Option<String>,

    /// Model used when a request names none, or names one outside `models`.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Allowlisted chat model identifiers.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Model used for one-shot title generation.
    #[serde(default = "default_title_model")]
    pub title_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            api_keys_file: None,
            default_model: default_model(),
            models: default_models(),
            title_model: default_title_model(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_models() -> Vec<String> {
    vec!["gemini-2.5-flash".to_string(), "gemini-2.5-pro".to_string()]
}

fn default_title_model() -> String {
    "gemini-2.5-flash-lite-preview-06-17".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_expectations() {
        let config = NimbusConfig::default();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.auth.lockout_attempts, 5);
        assert_eq!(config.auth.lockout_minutes, 15);
        assert_eq!(config.storage.conversations_dir, "conversations");
        assert_eq!(config.gemini.default_model, "gemini-2.5-flash");
        assert!(config.gemini.models.contains(&"gemini-2.5-pro".to_string()));
    }

    #[test]
    fn unknown_section_key_is_rejected() {
        let toml_str = r#"
[server]
host = "0.0.0.0"
prot = 8080
"#;
        assert!(toml::from_str::<NimbusConfig>(toml_str).is_err());
    }

    #[test]
    fn partial_section_fills_remaining_defaults() {
        let toml_str = r#"
[gemini]
api_keys = ["k1", "k2"]
"#;
        let config: NimbusConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gemini.api_keys.len(), 2);
        assert_eq!(config.gemini.default_model, "gemini-2.5-flash");
        assert_eq!(
            config.gemini.title_model,
            "gemini-2.5-flash-lite-preview-06-17"
        );
    }
}
