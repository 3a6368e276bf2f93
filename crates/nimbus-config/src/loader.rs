// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./nimbus.toml` > `~/.config/nimbus/nimbus.toml` > `/etc/nimbus/nimbus.toml`
//! with environment variable overrides via `NIMBUS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NimbusConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/nimbus/nimbus.toml` (system-wide)
/// 3. `~/.config/nimbus/nimbus.toml` (user XDG config)
/// 4. `./nimbus.toml` (local directory)
/// 5. `NIMBUS_*` environment variables
pub fn load_config() -> Result<NimbusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NimbusConfig::default()))
        .merge(Toml::file("/etc/nimbus/nimbus.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("nimbus/nimbus.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("nimbus.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and for explicitly chosen config files.
pub fn load_config_from_str(toml_content: &str) -> Result<NimbusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NimbusConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NimbusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NimbusConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `NIMBUS_GEMINI_DEFAULT_MODEL` must map
/// to `gemini.default_model`, not `gemini.default.model`.
fn env_provider() -> Env {
    Env::prefixed("NIMBUS_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: NIMBUS_AUTH_LOCKOUT_ATTEMPTS -> "auth_lockout_attempts"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gemini_", "gemini.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[server]
port = 9000

[auth]
lockout_attempts = 3
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.lockout_attempts, 3);
        // Untouched sections keep defaults.
        assert_eq!(config.auth.lockout_minutes, 15);
        assert_eq!(config.storage.uploads_dir, "uploads");
    }

    #[test]
    fn env_vars_override_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "nimbus.toml",
                r#"
[gemini]
default_model = "gemini-2.5-flash"
"#,
            )?;
            jail.set_env("NIMBUS_GEMINI_DEFAULT_MODEL", "gemini-2.5-pro");
            jail.set_env("NIMBUS_SERVER_PORT", "8080");

            let config: NimbusConfig = Figment::new()
                .merge(Serialized::defaults(NimbusConfig::default()))
                .merge(Toml::file("nimbus.toml"))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.gemini.default_model, "gemini-2.5-pro");
            assert_eq!(config.server.port, 8080);
            Ok(())
        });
    }

    #[test]
    fn underscore_keys_map_to_single_section_dot() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NIMBUS_AUTH_DEFAULT_ADMIN_USERNAME", "root");

            let config: NimbusConfig = Figment::new()
                .merge(Serialized::defaults(NimbusConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.auth.default_admin_username, "root");
            Ok(())
        });
    }
}
