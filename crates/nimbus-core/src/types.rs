// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation data model and streaming generation types.
//!
//! The serde shapes here match the on-disk conversation files byte for
//! byte: parts serialize as `{"text": …}` or `{"file_data": {…}}`, model
//! turns carry `thoughts`/`model`/`usage`, user turns do not.

use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// The wire/disk spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// Reference to attachment bytes stored outside the conversation file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// MIME type recorded at upload time.
    pub mime_type: String,
    /// Storage location of the attachment bytes.
    pub file_uri: String,
}

/// An atomic content fragment within a stored [`Message`].
///
/// Legacy files may contain part objects matching neither known shape;
/// those round-trip through [`Part::Opaque`] and are skipped at
/// reconstruction instead of failing the whole history parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    File { file_data: FileReference },
    Opaque(serde_json::Value),
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Creates a file-reference part.
    pub fn file(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Part::File {
            file_data: FileReference {
                mime_type: mime_type.into(),
                file_uri: file_uri.into(),
            },
        }
    }
}

/// Cumulative token accounting for one model turn.
///
/// During a stream, later snapshots supersede earlier ones; counters are
/// never summed across chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub thoughts_tokens: u64,
}

/// One turn in a persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Missing in some malformed legacy entries; such messages reconstruct
    /// to nothing rather than failing the read.
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Full reasoning trace, model turns only (may be empty).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,
    /// Identifier of the model variant that produced this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Final usage snapshot for this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Message {
    /// Creates a user message from already-validated parts.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
            thoughts: None,
            model: None,
            usage: None,
        }
    }

    /// Creates a model message from accumulated stream output.
    pub fn model(
        answer: impl Into<String>,
        thoughts: impl Into<String>,
        model: impl Into<String>,
        usage: Usage,
    ) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(answer)],
            thoughts: Some(thoughts.into()),
            model: Some(model.into()),
            usage: Some(usage),
        }
    }

    /// First text part's content, if any. Used for fallback titles and
    /// legacy listing entries.
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

// --- Model-ready content (post-hydration) ---

/// A fully hydrated content fragment ready to send upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelPart {
    Text(String),
    Blob { mime_type: String, data: Vec<u8> },
}

/// One role-tagged entry in the model-ready request sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelContent {
    pub role: Role,
    pub parts: Vec<ModelPart>,
}

/// A complete generation request assembled by the orchestrator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Allowlist-validated model identifier.
    pub model: String,
    /// Reconstructed prior history plus the new user turn, in order.
    pub contents: Vec<ModelContent>,
    /// Whether the upstream call should emit the thought channel.
    pub include_thoughts: bool,
}

// --- Streaming output ---

/// Output channel of a streamed text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentChannel {
    Thought,
    Answer,
}

/// One text fragment within a stream chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub channel: FragmentChannel,
    pub text: String,
}

/// One incremental unit of upstream output.
///
/// A chunk may carry any number of fragments and, independently, a
/// cumulative usage snapshot superseding all prior snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationChunk {
    pub fragments: Vec<Fragment>,
    pub usage: Option<Usage>,
}

impl GenerationChunk {
    /// Chunk containing a single answer fragment.
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            fragments: vec![Fragment {
                channel: FragmentChannel::Answer,
                text: text.into(),
            }],
            usage: None,
        }
    }

    /// Chunk containing a single thought fragment.
    pub fn thought(text: impl Into<String>) -> Self {
        Self {
            fragments: vec![Fragment {
                channel: FragmentChannel::Thought,
                text: text.into(),
            }],
            usage: None,
        }
    }

    /// Chunk carrying only a usage snapshot.
    pub fn usage_only(usage: Usage) -> Self {
        Self {
            fragments: Vec::new(),
            usage: Some(usage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_serializes_to_legacy_shape() {
        let json = serde_json::to_value(Part::text("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"text": "hello"}));
    }

    #[test]
    fn file_part_serializes_to_legacy_shape() {
        let json = serde_json::to_value(Part::file("image/png", "uploads/a.png")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"file_data": {"mime_type": "image/png", "file_uri": "uploads/a.png"}})
        );
    }

    #[test]
    fn unknown_part_shape_parses_as_opaque() {
        let json = serde_json::json!({"video_metadata": {"fps": 30}});
        let part: Part = serde_json::from_value(json.clone()).unwrap();
        match &part {
            Part::Opaque(v) => assert_eq!(*v, json),
            other => panic!("expected Opaque, got {other:?}"),
        }
        // Round-trips unchanged so a rewrite never loses legacy data.
        assert_eq!(serde_json::to_value(&part).unwrap(), json);
    }

    #[test]
    fn user_message_omits_model_fields() {
        let json = serde_json::to_value(Message::user(vec![Part::text("hi")])).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("thoughts").is_none());
        assert!(json.get("model").is_none());
        assert!(json.get("usage").is_none());
    }

    #[test]
    fn model_message_keeps_empty_thoughts() {
        let json = serde_json::to_value(Message::model(
            "Hi there",
            "",
            "gemini-2.5-flash",
            Usage::default(),
        ))
        .unwrap();
        assert_eq!(json["thoughts"], "");
        assert_eq!(json["model"], "gemini-2.5-flash");
        assert_eq!(json["usage"]["prompt_tokens"], 0);
    }

    #[test]
    fn message_without_parts_field_parses_to_empty() {
        let msg: Message = serde_json::from_str(r#"{"role": "user"}"#).unwrap();
        assert!(msg.parts.is_empty());
    }

    #[test]
    fn usage_defaults_missing_counters_to_zero() {
        let usage: Usage = serde_json::from_str(r#"{"prompt_tokens": 7}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 7);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.thoughts_tokens, 0);
    }

    #[test]
    fn first_text_skips_file_parts() {
        let msg = Message::user(vec![
            Part::file("image/png", "uploads/a.png"),
            Part::text("caption"),
        ]);
        assert_eq!(msg.first_text(), Some("caption"));
    }
}
