// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation provider for deterministic testing.
//!
//! `MockProvider` implements [`GenerationProvider`] from scripted FIFO
//! queues, enabling fast, CI-runnable tests without external API calls.
//! Locks are plain sync mutexes; guards are never held across an await.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use nimbus_core::{
    ChunkStream, GenerationChunk, GenerationProvider, GenerationRequest, NimbusError,
};

/// One scripted response to a `stream_generate` call.
pub enum ScriptedStream {
    /// Stream opens successfully and yields these items in order.
    Items(Vec<Result<GenerationChunk, NimbusError>>),
    /// The call fails before any streaming begins.
    OpenError(String),
}

/// A mock provider driven by pre-scripted streams and titles.
///
/// When the stream queue is empty, a single "mock response" answer chunk is
/// produced. When the title queue is empty, title generation fails — the
/// caller's deterministic fallback path is the default under test.
pub struct MockProvider {
    streams: Mutex<VecDeque<ScriptedStream>>,
    titles: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    title_transcripts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Creates a mock with empty queues.
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(VecDeque::new()),
            titles: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            title_transcripts: Mutex::new(Vec::new()),
        }
    }

    /// Queues one successful stream of chunks.
    pub fn push_chunks(&self, chunks: Vec<GenerationChunk>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(ScriptedStream::Items(chunks.into_iter().map(Ok).collect()));
    }

    /// Queues one stream with explicit per-item results (for mid-stream
    /// failure scripts).
    pub fn push_stream_items(&self, items: Vec<Result<GenerationChunk, NimbusError>>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(ScriptedStream::Items(items));
    }

    /// Queues one call that fails before streaming begins.
    pub fn push_open_error(&self, message: impl Into<String>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(ScriptedStream::OpenError(message.into()));
    }

    /// Queues one successful title.
    pub fn push_title(&self, title: impl Into<String>) {
        self.titles.lock().unwrap().push_back(Ok(title.into()));
    }

    /// Queues one failing title call.
    pub fn push_title_error(&self, message: impl Into<String>) {
        self.titles.lock().unwrap().push_back(Err(message.into()));
    }

    /// Builder-style convenience: a mock scripted with one answer chunk.
    pub fn with_answer(text: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.push_chunks(vec![GenerationChunk::answer(text)]);
        mock
    }

    /// Generation requests captured so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Transcripts passed to `generate_title` so far.
    pub fn title_transcripts(&self) -> Vec<String> {
        self.title_transcripts.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<ChunkStream, NimbusError> {
        self.requests.lock().unwrap().push(request);

        let scripted = self.streams.lock().unwrap().pop_front();
        match scripted {
            Some(ScriptedStream::Items(items)) => Ok(Box::pin(stream::iter(items))),
            Some(ScriptedStream::OpenError(message)) => Err(NimbusError::provider(message)),
            None => Ok(Box::pin(stream::iter(vec![Ok(GenerationChunk::answer(
                "mock response",
            ))]))),
        }
    }

    async fn generate_title(&self, transcript: &str) -> Result<String, NimbusError> {
        self.title_transcripts
            .lock()
            .unwrap()
            .push(transcript.to_string());

        match self.titles.lock().unwrap().pop_front() {
            Some(Ok(title)) => Ok(title),
            Some(Err(message)) => Err(NimbusError::provider(message)),
            None => Err(NimbusError::provider("no scripted title")),
        }
    }
}
