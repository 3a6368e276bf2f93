// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider trait abstracting the upstream streaming generation API.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::NimbusError;
use crate::types::{GenerationChunk, GenerationRequest};

/// A pinned, boxed stream of generation chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk, NimbusError>> + Send>>;

/// Abstraction over a streaming generation capability.
///
/// The orchestrator in `nimbus-chat` drives this trait; `nimbus-gemini`
/// implements it against the Gemini API and `nimbus-test-utils` provides a
/// scripted mock. Credentials are drawn per call by the implementation —
/// an empty pool fails with [`NimbusError::NotConfigured`] before any
/// network activity.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Opens an incremental generation call.
    ///
    /// Errors returned here occur before any output is produced; errors
    /// yielded by the stream occur mid-generation.
    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<ChunkStream, NimbusError>;

    /// One-shot structured-output call summarizing a transcript into a
    /// short title. Any failure propagates; fallback is the caller's job.
    async fn generate_title(&self, transcript: &str) -> Result<String, NimbusError>;
}
