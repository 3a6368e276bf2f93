// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed conversation persistence for the Nimbus chat server.
//!
//! One JSON file per conversation id. Readers accept both the structured
//! record shape and the legacy bare-array shape; writers always emit the
//! structured shape.

pub mod record;
pub mod store;

pub use record::{
    Conversation, ConversationFile, ConversationSummary, DEFAULT_TITLE, TITLE_MAX_CHARS,
    fallback_title, truncate_chars,
};
pub use store::ConversationStore;
