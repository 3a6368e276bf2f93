// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! POST /api/chat: multipart parsing and the SSE response writer.
//!
//! The multipart form carries `conversation_id`, optional `message` text,
//! optional legacy inline `attachments`, repeated `pre_uploaded_files`
//! JSON references, and an optional `model` name. Once the orchestrator
//! returns an event stream, each event becomes one `data: <json>` block on
//! a `text/event-stream` response; errors after that point travel inside
//! the stream, never as an HTTP status.

use axum::{
    extract::{Multipart, State},
    response::sse::{Event, Sse},
};
use futures::stream::{Stream, StreamExt};
use nimbus_chat::{ChatTurn, is_allowed_mime};
use nimbus_core::{FileReference, NimbusError};
use serde::Deserialize;
use tracing::warn;

use crate::handlers::ApiError;
use crate::server::AppState;

/// One `pre_uploaded_files` entry as sent by the browser.
#[derive(Debug, Deserialize)]
struct PreUploadedFile {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

/// POST /api/chat
pub async fn post_chat(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let mut conversation_id: Option<String> = None;
    let mut message = String::new();
    let mut model: Option<String> = None;
    let mut attachments: Vec<FileReference> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| NimbusError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("conversation_id") => {
                conversation_id = Some(read_text(field).await?);
            }
            Some("message") => {
                message = read_text(field).await?;
            }
            Some("model") => {
                model = Some(read_text(field).await?);
            }
            Some("pre_uploaded_files") => {
                let raw = read_text(field).await?;
                match serde_json::from_str::<PreUploadedFile>(&raw) {
                    Ok(PreUploadedFile {
                        path: Some(path),
                        mime_type: Some(mime_type),
                    }) => attachments.push(FileReference {
                        mime_type,
                        file_uri: path,
                    }),
                    Ok(_) => {
                        warn!("pre-uploaded file entry missing path or mime_type, skipping");
                    }
                    Err(e) => {
                        warn!(error = %e, "unparseable pre-uploaded file entry, skipping");
                    }
                }
            }
            Some("attachments") => {
                // Legacy path: file bytes arrive inline with the chat call.
                let Some(filename) = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.is_empty())
                else {
                    continue;
                };
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_default();
                if !is_allowed_mime(&mime_type) {
                    return Err(NimbusError::UnsupportedType(mime_type).into());
                }
                let data = field.bytes().await.map_err(|e| {
                    NimbusError::InvalidInput(format!("failed to read attachment: {e}"))
                })?;

                let file_id = format!("{}-{}", uuid::Uuid::new_v4(), filename);
                let path = state.uploads_dir.join(&file_id);
                tokio::fs::write(&path, &data)
                    .await
                    .map_err(|e| NimbusError::storage("failed to store attachment", e))?;
                attachments.push(FileReference {
                    mime_type,
                    file_uri: path.to_string_lossy().into_owned(),
                });
            }
            _ => {}
        }
    }

    let conversation_id = conversation_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NimbusError::InvalidInput("Missing conversation_id".to_string()))?;

    let events = state
        .orchestrator
        .chat(ChatTurn {
            conversation_id,
            message,
            attachments,
            model,
        })
        .await?;

    Ok(Sse::new(
        events.map(|event| Event::default().json_data(event)),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, NimbusError> {
    field
        .text()
        .await
        .map_err(|e| NimbusError::InvalidInput(format!("malformed form field: {e}")))
}
