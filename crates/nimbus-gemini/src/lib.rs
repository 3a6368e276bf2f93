// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini provider for the Nimbus chat server.
//!
//! This crate implements [`GenerationProvider`] against the Gemini
//! generateContent API: streaming chat turns with the thought channel
//! enabled, and a one-shot structured-output call for titles.

pub mod client;
pub mod keys;
pub mod sse;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use nimbus_config::model::GeminiConfig;
use nimbus_core::{ChunkStream, GenerationProvider, GenerationRequest, NimbusError};
use tracing::info;

use crate::client::GeminiClient;
use crate::keys::KeyPool;
use crate::types::{
    GenerateContentRequest, GenerationConfig, ThinkingConfig, TitleResponse, WireContent,
    WirePart, wire_contents,
};

/// Gemini provider implementing [`GenerationProvider`].
pub struct GeminiProvider {
    client: GeminiClient,
    title_model: String,
}

impl GeminiProvider {
    /// Creates a provider from configuration and an injected key pool.
    pub fn new(config: &GeminiConfig, keys: Arc<KeyPool>) -> Result<Self, NimbusError> {
        let client = GeminiClient::new(keys.clone())?;
        info!(
            keys = keys.len(),
            title_model = %config.title_model,
            "Gemini provider initialized"
        );
        Ok(Self {
            client,
            title_model: config.title_model.clone(),
        })
    }

    #[cfg(test)]
    fn with_client(client: GeminiClient, title_model: String) -> Self {
        Self {
            client,
            title_model,
        }
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<ChunkStream, NimbusError> {
        let wire = GenerateContentRequest {
            contents: wire_contents(&request.contents),
            generation_config: Some(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    include_thoughts: Some(request.include_thoughts),
                    thinking_budget: None,
                }),
                ..GenerationConfig::default()
            }),
        };
        self.client
            .stream_generate_content(&request.model, &wire)
            .await
    }

    async fn generate_title(&self, transcript: &str) -> Result<String, NimbusError> {
        let prompt = format!(
            "This is a conversation between a user and an AI assistant.\n\
             Please generate a title for the conversation.\n\
             The title should capture the main topic of the conversation.\n\
             The title should be no more than 50 characters.\n\
             The title should be in the same language as the conversation.\n\
             \n\
             Conversation:\n\
             {transcript}"
        );

        let wire = GenerateContentRequest {
            contents: vec![WireContent {
                role: "user".to_string(),
                parts: vec![WirePart {
                    text: Some(prompt),
                    ..WirePart::default()
                }],
            }],
            generation_config: Some(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    include_thoughts: None,
                    thinking_budget: Some(0),
                }),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(title_schema()),
            }),
        };

        let response = self.client.generate_content(&self.title_model, &wire).await?;
        let text = response
            .first_text()
            .ok_or_else(|| NimbusError::provider("title response carried no text"))?;
        let parsed: TitleResponse =
            serde_json::from_str(&text).map_err(|e| NimbusError::Provider {
                message: format!("failed to parse title response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.title)
    }
}

/// Response schema forcing `{"title": "…"}` structured output.
fn title_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "title": {"type": "STRING"}
        },
        "required": ["title"]
    })
}
