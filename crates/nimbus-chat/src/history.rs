// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconstruction of stored history into model-ready contents.
//!
//! Order is preserved exactly as stored: chat logs are append-only, so no
//! reordering or dedup happens here. Messages that produce zero fragments
//! (no non-empty text, all attachments unknown shapes) are dropped from
//! the model-ready sequence but left untouched on disk.

use nimbus_core::{Message, ModelContent, ModelPart, Part};

use crate::resolver;

/// Converts a persisted history into the ordered, role-tagged sequence the
/// model consumes, hydrating file references along the way.
pub async fn reconstruct(history: &[Message]) -> Vec<ModelContent> {
    let mut contents = Vec::with_capacity(history.len());

    for message in history {
        let mut parts = Vec::new();
        for part in &message.parts {
            match part {
                Part::Text { text } => {
                    if !text.is_empty() {
                        parts.push(ModelPart::Text(text.clone()));
                    }
                }
                Part::File { file_data } => {
                    parts.push(resolver::hydrate(file_data).await);
                }
                // Unknown legacy part shape: skip, never crash the read.
                Part::Opaque(_) => {}
            }
        }

        if !parts.is_empty() {
            contents.push(ModelContent {
                role: message.role,
                parts,
            });
        }
    }

    contents
}
