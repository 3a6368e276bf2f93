// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed conversation store: one JSON file per conversation id.
//!
//! Listing and read paths prioritize durability over strict validation:
//! a file that fails to parse yields a "Corrupted Chat" listing entry or an
//! empty history, never an error. Mutating paths (`rename`,
//! `append_exchange`) hold a per-id async mutex across their
//! read-modify-write, and rewrite files via a temp-file rename.

use std::cmp::Ordering;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use nimbus_core::{Message, NimbusError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::record::{
    Conversation, ConversationFile, ConversationSummary, DEFAULT_TITLE, fallback_title,
    legacy_listing_title,
};

/// File-backed store of conversation records.
pub struct ConversationStore {
    dir: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationStore {
    /// Opens (and creates if needed) the conversations directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, NimbusError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| NimbusError::storage("failed to create conversations directory", e))?;
        Ok(Self {
            dir,
            locks: DashMap::new(),
        })
    }

    /// Lists every discoverable conversation, most recent first.
    ///
    /// Never fails on individual records: unparseable files become
    /// sentinel entries titled "Corrupted Chat".
    pub async fn list(&self) -> Result<Vec<ConversationSummary>, NimbusError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| NimbusError::storage("failed to read conversations directory", e))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| NimbusError::storage("failed to read directory entry", e))?
        {
            let path = entry.path();
            let Some(id) = conversation_id_of(&path) else {
                continue;
            };

            let sort_key_fallback = mtime_secs(&path).await;
            let summary = match read_record(&path).await {
                Ok(ConversationFile::Structured {
                    title,
                    history,
                    created_at,
                }) => ConversationSummary {
                    id,
                    title,
                    sort_key: created_at.unwrap_or(sort_key_fallback),
                    is_empty: history.is_empty(),
                },
                Ok(ConversationFile::Legacy(history)) => ConversationSummary {
                    id,
                    title: legacy_listing_title(&history),
                    sort_key: sort_key_fallback,
                    is_empty: history.is_empty(),
                },
                Err(e) => {
                    warn!(conversation_id = %id, error = %e, "unparseable conversation file");
                    ConversationSummary {
                        id,
                        title: "Corrupted Chat".to_string(),
                        sort_key: sort_key_fallback,
                        is_empty: true,
                    }
                }
            };
            summaries.push(summary);
        }

        summaries.sort_by(|a, b| {
            b.sort_key
                .partial_cmp(&a.sort_key)
                .unwrap_or(Ordering::Equal)
        });
        Ok(summaries)
    }

    /// Allocates a fresh conversation with the default title.
    pub async fn create(&self) -> Result<ConversationSummary, NimbusError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = Conversation::new(now_unix());
        self.write_record(&self.path_for(&id)?, &record).await?;
        info!(conversation_id = %id, "conversation created");
        Ok(ConversationSummary {
            id,
            title: record.title,
            sort_key: record.created_at,
            is_empty: true,
        })
    }

    /// Reads a conversation's history.
    ///
    /// Fails with `NotFound` when no file exists for `id`; an unparseable
    /// file yields an empty history instead of an error.
    pub async fn read(&self, id: &str) -> Result<Vec<Message>, NimbusError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(NimbusError::NotFound(id.to_string()));
        }
        match read_record(&path).await {
            Ok(ConversationFile::Structured { history, .. }) => Ok(history),
            Ok(ConversationFile::Legacy(history)) => Ok(history),
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "unparseable conversation file, returning empty history");
                Ok(Vec::new())
            }
        }
    }

    /// Deletes a conversation. A second delete of the same id reports
    /// `NotFound`.
    pub async fn delete(&self, id: &str) -> Result<(), NimbusError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(conversation_id = %id, "conversation deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(NimbusError::NotFound(id.to_string()))
            }
            Err(e) => Err(NimbusError::storage("failed to delete conversation", e)),
        }
    }

    /// Replaces a conversation's title, migrating legacy records to the
    /// structured shape in the same write. `created_at` is preserved from
    /// the record, or from the file's modification time for records that
    /// never carried one.
    pub async fn rename(&self, id: &str, new_title: &str) -> Result<String, NimbusError> {
        let path = self.path_for(id)?;
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        if !path.exists() {
            return Err(NimbusError::NotFound(id.to_string()));
        }

        let mtime = mtime_secs(&path).await;
        let file = read_record(&path).await.map_err(|e| NimbusError::Storage {
            message: format!("failed to update conversation: {e}"),
            source: None,
        })?;
        let mut record = file.into_conversation(mtime);
        record.title = new_title.to_string();

        self.write_record(&path, &record).await?;
        debug!(conversation_id = %id, title = %record.title, "conversation renamed");
        Ok(record.title)
    }

    /// Appends one completed exchange (user turn then model turn) and
    /// persists the record in the structured shape.
    ///
    /// When this is the record's first completed exchange and the title is
    /// still the default, `title_fn` supplies a replacement; on its failure
    /// the title deterministically falls back to the first line of the
    /// user's text.
    ///
    /// A missing or unparseable file is treated as a fresh empty record so
    /// a turn against a vanished conversation still persists.
    pub async fn append_exchange<F, Fut>(
        &self,
        id: &str,
        user_message: Message,
        model_message: Message,
        title_fn: F,
    ) -> Result<Conversation, NimbusError>
    where
        F: FnOnce(Conversation) -> Fut + Send,
        Fut: Future<Output = Result<String, NimbusError>> + Send,
    {
        let path = self.path_for(id)?;
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut record = if path.exists() {
            let mtime = mtime_secs(&path).await;
            match read_record(&path).await {
                Ok(file) => file.into_conversation(mtime),
                Err(e) => {
                    warn!(conversation_id = %id, error = %e, "unparseable conversation file, starting fresh");
                    Conversation::new(now_unix())
                }
            }
        } else {
            Conversation::new(now_unix())
        };

        let fallback = fallback_title(&user_message);
        record.history.push(user_message);
        record.history.push(model_message);

        if record.history.len() == 2 && record.title == DEFAULT_TITLE {
            record.title = match title_fn(record.clone()).await {
                Ok(title) => title,
                Err(e) => {
                    warn!(conversation_id = %id, error = %e, "title generation failed, using fallback");
                    fallback
                }
            };
        }

        self.write_record(&path, &record).await?;
        info!(
            conversation_id = %id,
            history_len = record.history.len(),
            "exchange persisted"
        );
        Ok(record)
    }

    /// Tolerant load for the chat flow: a missing or unparseable file
    /// yields a fresh empty record rather than an error.
    pub async fn load_or_default(&self, id: &str) -> Result<Conversation, NimbusError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(Conversation::new(now_unix()));
        }
        let mtime = mtime_secs(&path).await;
        match read_record(&path).await {
            Ok(file) => Ok(file.into_conversation(mtime)),
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "unparseable conversation file, treating as empty");
                Ok(Conversation::new(now_unix()))
            }
        }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, NimbusError> {
        // Ids are opaque UUID-style tokens; anything else (including path
        // separators) is treated as an unknown conversation.
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(NimbusError::NotFound(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn write_record(&self, path: &Path, record: &Conversation) -> Result<(), NimbusError> {
        let bytes = serde_json::to_vec_pretty(record).map_err(|e| NimbusError::Storage {
            message: format!("failed to serialize conversation: {e}"),
            source: Some(Box::new(e)),
        })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| NimbusError::storage("failed to write conversation", e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| NimbusError::storage("failed to replace conversation file", e))?;
        Ok(())
    }
}

/// Extracts the conversation id from a `<id>.json` path, if it is one.
fn conversation_id_of(path: &Path) -> Option<String> {
    if path.extension()? != "json" {
        return None;
    }
    Some(path.file_stem()?.to_string_lossy().into_owned())
}

async fn read_record(path: &Path) -> Result<ConversationFile, serde_json::Error> {
    let bytes = tokio::fs::read(path).await.unwrap_or_default();
    serde_json::from_slice(&bytes)
}

/// Current time as fractional unix seconds, the on-disk timestamp unit.
fn now_unix() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// File modification time as fractional unix seconds, 0.0 when unknown.
async fn mtime_secs(path: &Path) -> f64 {
    match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0),
        Err(_) => 0.0,
    }
}
