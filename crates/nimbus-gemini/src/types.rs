// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini REST API request/response wire types.
//!
//! The REST surface is camelCase (`inlineData`, `usageMetadata`); the
//! conversion helpers here translate between the wire shapes and the
//! model-agnostic types in `nimbus-core`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use nimbus_core::{Fragment, FragmentChannel, GenerationChunk, ModelContent, ModelPart, Usage};
use serde::{Deserialize, Serialize};

// --- Request types ---

/// Body of `models/{model}:generateContent` and `:streamGenerateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One role-tagged content entry on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireContent {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

/// One content part on the wire. Response parts carry `thought: true` for
/// reasoning-trace fragments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thought: bool,
}

/// Base64-encoded attachment bytes with their MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Generation tuning knobs used by Nimbus.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

/// Thinking-channel configuration.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_thoughts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<i32>,
}

// --- Response types ---

/// A full or streamed-chunk response from the Gemini API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// One response candidate. Nimbus only ever consumes the first.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<WireContent>,
}

/// Cumulative token counts reported with a chunk.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub thoughts_token_count: u64,
}

impl From<UsageMetadata> for Usage {
    fn from(meta: UsageMetadata) -> Self {
        Usage {
            prompt_tokens: meta.prompt_token_count,
            completion_tokens: meta.candidates_token_count,
            thoughts_tokens: meta.thoughts_token_count,
        }
    }
}

impl GenerateContentResponse {
    /// Flattens one streamed response into a provider-agnostic chunk.
    ///
    /// Empty text parts are dropped; the usage snapshot is taken even from
    /// chunks that carry no candidates, so a trailing usage-only chunk
    /// still supersedes earlier counters.
    pub fn into_chunk(self) -> GenerationChunk {
        let usage = self.usage_metadata.map(Usage::from);
        let fragments = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| {
                        let text = part.text?;
                        if text.is_empty() {
                            return None;
                        }
                        Some(Fragment {
                            channel: if part.thought {
                                FragmentChannel::Thought
                            } else {
                                FragmentChannel::Answer
                            },
                            text,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        GenerationChunk { fragments, usage }
    }

    /// First candidate's concatenated answer text, for one-shot calls.
    pub fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Error body returned by the Gemini API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Detail within an API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Structured-output payload of the title call.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleResponse {
    pub title: String,
}

// --- Conversions from core types ---

/// Converts hydrated model-ready contents into wire contents, base64
/// encoding attachment bytes.
pub fn wire_contents(contents: &[ModelContent]) -> Vec<WireContent> {
    contents
        .iter()
        .map(|content| WireContent {
            role: content.role.as_str().to_string(),
            parts: content
                .parts
                .iter()
                .map(|part| match part {
                    ModelPart::Text(text) => WirePart {
                        text: Some(text.clone()),
                        ..WirePart::default()
                    },
                    ModelPart::Blob { mime_type, data } => WirePart {
                        inline_data: Some(InlineData {
                            mime_type: mime_type.clone(),
                            data: BASE64.encode(data),
                        }),
                        ..WirePart::default()
                    },
                })
                .collect(),
        })
        .collect()
}
