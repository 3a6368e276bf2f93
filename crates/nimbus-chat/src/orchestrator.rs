// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The streaming chat orchestrator.
//!
//! One request moves through PREPARING -> STREAMING -> FINALIZING.
//! Preparation (validation, history reconstruction, opening the upstream
//! call) happens before any event is produced, so those failures surface
//! as plain errors. Once streaming begins, a producer task forwards typed
//! events through a bounded channel of one — the HTTP writer observes
//! them strictly in arrival order with no buffering beyond one event —
//! and persists the exchange only on clean stream exhaustion. A failed
//! send means the client is gone: the turn is abandoned unpersisted.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use nimbus_core::{
    FileReference, FragmentChannel, GenerationProvider, GenerationRequest, Message, ModelContent,
    ModelPart, NimbusError, Part, Role, Usage,
};
use nimbus_store::ConversationStore;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::event::ChatEvent;
use crate::{history, resolver, title};

/// The outward event stream of one chat turn.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// One incoming chat turn, already parsed out of the HTTP form.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub conversation_id: String,
    /// User text; may be empty when attachments carry the turn.
    pub message: String,
    /// References to already-stored attachment bytes for this turn.
    pub attachments: Vec<FileReference>,
    /// Requested model; silently replaced by the default when absent or
    /// not allowlisted.
    pub model: Option<String>,
}

/// Drives one model call per chat request and persists the outcome.
pub struct ChatOrchestrator {
    store: Arc<ConversationStore>,
    provider: Arc<dyn GenerationProvider>,
    models: Vec<String>,
    default_model: String,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<ConversationStore>,
        provider: Arc<dyn GenerationProvider>,
        models: Vec<String>,
        default_model: String,
    ) -> Self {
        Self {
            store,
            provider,
            models,
            default_model,
        }
    }

    /// Validates a requested model against the allowlist, substituting the
    /// default instead of rejecting.
    fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested {
            Some(name) if self.models.iter().any(|m| m == name) => name.to_string(),
            Some(name) => {
                debug!(requested = name, default = %self.default_model, "unknown model, using default");
                self.default_model.clone()
            }
            None => self.default_model.clone(),
        }
    }

    /// Runs one chat turn.
    ///
    /// Errors returned here (empty message, missing credentials, upstream
    /// connect failure) occur before any streaming; once a stream is
    /// returned, failures travel on it as a terminal `error` event.
    pub async fn chat(&self, turn: ChatTurn) -> Result<ChatEventStream, NimbusError> {
        // PREPARING: assemble the new user turn.
        let model = self.resolve_model(turn.model.as_deref());

        let mut turn_parts: Vec<ModelPart> = Vec::new();
        let mut stored_parts: Vec<Part> = Vec::new();
        if !turn.message.is_empty() {
            turn_parts.push(ModelPart::Text(turn.message.clone()));
            stored_parts.push(Part::text(turn.message.clone()));
        }
        for reference in &turn.attachments {
            if let Some(part) = resolver::load_attachment(reference).await {
                turn_parts.push(part);
                stored_parts.push(Part::File {
                    file_data: reference.clone(),
                });
            }
        }
        if turn_parts.is_empty() {
            return Err(NimbusError::EmptyMessage);
        }

        // Reconstruct prior history. A vanished or corrupted record yields
        // an empty history; the write at the end recreates the file.
        let conversation = self.store.load_or_default(&turn.conversation_id).await?;
        let mut contents = history::reconstruct(&conversation.history).await;
        contents.push(ModelContent {
            role: Role::User,
            parts: turn_parts,
        });

        let upstream = self
            .provider
            .stream_generate(GenerationRequest {
                model: model.clone(),
                contents,
                include_thoughts: true,
            })
            .await?;

        // STREAMING: producer task pushes events through a channel of one.
        let (tx, rx) = mpsc::channel::<ChatEvent>(1);
        let store = self.store.clone();
        let provider = self.provider.clone();
        let conversation_id = turn.conversation_id;

        tokio::spawn(async move {
            let mut upstream = upstream;
            let mut usage = Usage::default();
            let mut answer = String::new();
            let mut thoughts = String::new();

            while let Some(item) = upstream.next().await {
                match item {
                    Ok(chunk) => {
                        if let Some(snapshot) = chunk.usage {
                            usage = snapshot;
                        }
                        for fragment in chunk.fragments {
                            if fragment.text.is_empty() {
                                continue;
                            }
                            let event = match fragment.channel {
                                FragmentChannel::Thought => {
                                    thoughts.push_str(&fragment.text);
                                    ChatEvent::Thoughts {
                                        content: fragment.text,
                                        usage,
                                    }
                                }
                                FragmentChannel::Answer => {
                                    answer.push_str(&fragment.text);
                                    ChatEvent::Answer {
                                        content: fragment.text,
                                        usage,
                                    }
                                }
                            };
                            if tx.send(event).await.is_err() {
                                debug!(conversation_id = %conversation_id, "client disconnected mid-stream, abandoning turn");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        // Mid-stream failure discards everything
                        // accumulated for this turn; nothing is persisted.
                        warn!(conversation_id = %conversation_id, error = %e, "upstream failure mid-stream");
                        let _ = tx
                            .send(ChatEvent::Error {
                                content: e.to_string(),
                            })
                            .await;
                        return;
                    }
                }
            }

            // FINALIZING: persist, then emit the terminal event.
            let user_message = Message::user(stored_parts);
            let model_message = Message::model(answer, thoughts, model, usage);
            let title_provider = provider.clone();
            let result = store
                .append_exchange(&conversation_id, user_message, model_message, move |record| {
                    async move { title::generate_title(title_provider.as_ref(), &record).await }
                })
                .await;

            let terminal = match result {
                Ok(record) => ChatEvent::Done {
                    new_title: record.title,
                    usage,
                },
                Err(e) => {
                    error!(conversation_id = %conversation_id, error = %e, "failed to persist exchange");
                    ChatEvent::Error {
                        content: e.to_string(),
                    }
                }
            };
            let _ = tx.send(terminal).await;
        });

        Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })))
    }
}
