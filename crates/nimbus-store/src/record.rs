// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk conversation record shapes and the legacy-format migration point.
//!
//! Readers accept two shapes: the structured `{title, history, created_at}`
//! object and the legacy bare message array. Writers always emit the
//! structured shape. Migration happens in exactly one place,
//! [`ConversationFile::into_conversation`], executed once per mutating
//! access.

use nimbus_core::Message;
use serde::{Deserialize, Serialize};

/// Title given to conversations that have not earned one yet.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// A resolved conversation record, always structured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub title: String,
    pub history: Vec<Message>,
    /// Unix seconds, fractional. Immutable after creation; for migrated
    /// legacy records this is the file's modification time.
    pub created_at: f64,
}

impl Conversation {
    /// A fresh, empty record created now.
    pub fn new(created_at: f64) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            history: Vec::new(),
            created_at,
        }
    }
}

/// One parsed conversation file, before migration.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConversationFile {
    /// Structured shape. Fields are individually defaulted so partially
    /// written dict files still load instead of degrading to "corrupted".
    Structured {
        #[serde(default = "default_title")]
        title: String,
        #[serde(default)]
        history: Vec<Message>,
        #[serde(default)]
        created_at: Option<f64>,
    },
    /// Legacy shape: a bare ordered array of messages.
    Legacy(Vec<Message>),
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl ConversationFile {
    /// Resolves either shape into a structured [`Conversation`].
    ///
    /// `fallback_created_at` (the file's modification time) becomes
    /// `created_at` for legacy records and for structured records that
    /// never carried one.
    pub fn into_conversation(self, fallback_created_at: f64) -> Conversation {
        match self {
            ConversationFile::Structured {
                title,
                history,
                created_at,
            } => Conversation {
                title,
                history,
                created_at: created_at.unwrap_or(fallback_created_at),
            },
            ConversationFile::Legacy(history) => Conversation {
                title: DEFAULT_TITLE.to_string(),
                history,
                created_at: fallback_created_at,
            },
        }
    }
}

/// One entry in the conversation listing.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    /// Server-side ordering key, not part of the client payload.
    #[serde(skip)]
    pub sort_key: f64,
    pub is_empty: bool,
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Deterministic title for a record's first exchange when generation fails:
/// the first line of the user's text, capped at [`TITLE_MAX_CHARS`].
pub fn fallback_title(user_message: &Message) -> String {
    user_message
        .first_text()
        .map(|text| truncate_chars(text.lines().next().unwrap_or(""), TITLE_MAX_CHARS))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Display title for a legacy record in the listing: first line of the
/// first message's text, capped at 30 characters. Display only — the file
/// itself is not rewritten by `list`.
pub fn legacy_listing_title(history: &[Message]) -> String {
    history
        .first()
        .and_then(|m| m.first_text())
        .map(|text| truncate_chars(text.lines().next().unwrap_or(""), 30))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::Part;

    #[test]
    fn legacy_array_parses_and_migrates() {
        let raw = r#"[{"role": "user", "parts": [{"text": "hello"}]},
                      {"role": "model", "parts": [{"text": "hi"}], "thoughts": ""}]"#;
        let file: ConversationFile = serde_json::from_str(raw).unwrap();
        let conv = file.into_conversation(1700000000.5);
        assert_eq!(conv.title, DEFAULT_TITLE);
        assert_eq!(conv.history.len(), 2);
        assert_eq!(conv.created_at, 1700000000.5);
    }

    #[test]
    fn structured_record_keeps_own_created_at() {
        let raw = r#"{"title": "Trip planning", "history": [], "created_at": 1650000000.0}"#;
        let file: ConversationFile = serde_json::from_str(raw).unwrap();
        let conv = file.into_conversation(1700000000.0);
        assert_eq!(conv.title, "Trip planning");
        assert_eq!(conv.created_at, 1650000000.0);
    }

    #[test]
    fn structured_record_without_created_at_uses_fallback() {
        let raw = r#"{"title": "Old dict", "history": []}"#;
        let file: ConversationFile = serde_json::from_str(raw).unwrap();
        let conv = file.into_conversation(1690000000.0);
        assert_eq!(conv.created_at, 1690000000.0);
    }

    #[test]
    fn fallback_title_takes_first_line_capped() {
        let msg = nimbus_core::Message::user(vec![Part::text(
            "Please summarize this very long report about quarterly revenue figures\nsecond line",
        )]);
        let title = fallback_title(&msg);
        assert_eq!(title.chars().count(), 50);
        assert!(!title.contains('\n'));
    }

    #[test]
    fn fallback_title_handles_attachment_only_message() {
        let msg = nimbus_core::Message::user(vec![Part::file("image/png", "uploads/a.png")]);
        assert_eq!(fallback_title(&msg), DEFAULT_TITLE);
    }

    #[test]
    fn fallback_title_counts_characters_not_bytes() {
        let long: String = "日".repeat(60);
        let msg = nimbus_core::Message::user(vec![Part::text(long)]);
        assert_eq!(fallback_title(&msg).chars().count(), 50);
    }

    #[test]
    fn legacy_listing_title_caps_at_thirty() {
        let history = vec![nimbus_core::Message::user(vec![Part::text(
            "a question that is considerably longer than thirty characters",
        )])];
        assert_eq!(legacy_listing_title(&history).chars().count(), 30);
    }
}
