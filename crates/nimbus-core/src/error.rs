// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Nimbus chat server.

use thiserror::Error;

/// The primary error type used across all Nimbus crates.
///
/// The HTTP gateway maps each variant to a status code; see
/// `nimbus-gateway`. Stored-file parse errors are recovered locally by the
/// conversation store and never surface through this type on the listing
/// and read paths.
#[derive(Debug, Error)]
pub enum NimbusError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested conversation does not exist.
    #[error("conversation not found: {0}")]
    NotFound(String),

    /// A required request field was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A chat submission carried no text and no usable attachment.
    #[error("cannot send an empty message")]
    EmptyMessage,

    /// A submitted file's MIME type is outside the allowlist.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// No upstream API credentials are available.
    #[error("no API keys configured")]
    NotConfigured,

    /// Login or session verification failed. The message is user-facing.
    #[error("{0}")]
    Auth(String),

    /// Upstream generation errors (API failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persistence errors (file I/O, serialization on write).
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NimbusError {
    /// Convenience constructor for storage failures wrapping an I/O error.
    pub fn storage(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Convenience constructor for provider failures without a source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_user_presentable() {
        assert_eq!(
            NimbusError::EmptyMessage.to_string(),
            "cannot send an empty message"
        );
        assert_eq!(
            NimbusError::UnsupportedType("application/x-msdownload".into()).to_string(),
            "unsupported file type: application/x-msdownload"
        );
        assert_eq!(
            NimbusError::NotFound("abc".into()).to_string(),
            "conversation not found: abc"
        );
        assert_eq!(NimbusError::NotConfigured.to_string(), "no API keys configured");
    }

    #[test]
    fn auth_variant_passes_message_through() {
        let err = NimbusError::Auth("Invalid username or password. 3 attempts remaining.".into());
        assert_eq!(
            err.to_string(),
            "Invalid username or password. 3 attempts remaining."
        );
    }

    #[test]
    fn storage_constructor_keeps_source() {
        let err = NimbusError::storage(
            "failed to write conversation",
            std::io::Error::other("disk full"),
        );
        match err {
            NimbusError::Storage { source, .. } => assert!(source.is_some()),
            other => panic!("expected Storage, got {other:?}"),
        }
    }
}
