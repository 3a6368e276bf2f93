// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini generateContent API.
//!
//! Provides [`GeminiClient`] which handles request construction, per-call
//! key rotation, and streaming SSE responses. No local retry is layered on
//! top: a single upstream failure is terminal for that turn.

use std::sync::Arc;
use std::time::Duration;

use nimbus_core::{ChunkStream, NimbusError};
use tracing::debug;

use crate::keys::KeyPool;
use crate::sse;
use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Base URL for the Gemini API.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// HTTP client for Gemini API communication.
///
/// Each call draws the next key from the injected [`KeyPool`], so load is
/// distributed across upstream accounts without shared module state.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    keys: Arc<KeyPool>,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new Gemini API client around a key pool.
    pub fn new(keys: Arc<KeyPool>) -> Result<Self, NimbusError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| NimbusError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            keys,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Opens a streaming generation call and returns the chunk stream.
    ///
    /// Fails before any network activity when the key pool is empty.
    pub async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream, NimbusError> {
        let key = self.keys.next_key()?;
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(request)
            .send()
            .await
            .map_err(|e| NimbusError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model, "streaming response received");

        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        Ok(sse::parse_sse_stream(response))
    }

    /// Sends a non-streaming call and returns the full response.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, NimbusError> {
        let key = self.keys.next_key()?;
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(request)
            .send()
            .await
            .map_err(|e| NimbusError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model, "completion response received");

        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body = response.text().await.map_err(|e| NimbusError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&body).map_err(|e| NimbusError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Decodes a non-success response into a provider error, preferring the
/// structured API error body when present.
async fn api_error(status: reqwest::StatusCode, response: reqwest::Response) -> NimbusError {
    let body = response.text().await.unwrap_or_default();
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
        format!(
            "Gemini API error ({}): {}",
            api_err.error.status, api_err.error.message
        )
    } else {
        format!("API returned {status}: {body}")
    };
    NimbusError::Provider {
        message,
        source: None,
    }
}
