// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment MIME allowlist and hydration.
//!
//! Two failure policies apply, by design:
//! - the allowlist gates *new* content at submission time only;
//! - hydration of already-stored references never applies the allowlist
//!   and never aborts a turn — a missing file degrades to a placeholder
//!   text fragment in history, and is skipped for the current turn.

use nimbus_core::{FileReference, ModelPart};
use tracing::warn;

/// MIME types exactly matched by the allowlist, beyond the wildcard
/// families.
const EXACT_ALLOWED: [&str; 3] = ["application/pdf", "application/json", "application/zip"];

/// Whether `mime` is acceptable for newly submitted content.
pub fn is_allowed_mime(mime: &str) -> bool {
    mime.starts_with("image/")
        || mime.starts_with("video/")
        || mime.starts_with("audio/")
        || mime.contains("text")
        || EXACT_ALLOWED.contains(&mime)
}

/// Hydrates a stored reference into model-ready bytes.
///
/// An unreadable reference degrades to a synthetic text part naming the
/// missing location, so old history survives attachment deletion.
pub async fn hydrate(reference: &FileReference) -> ModelPart {
    match tokio::fs::read(&reference.file_uri).await {
        Ok(data) => ModelPart::Blob {
            mime_type: reference.mime_type.clone(),
            data,
        },
        Err(e) => {
            warn!(uri = %reference.file_uri, error = %e, "attachment unreadable, substituting placeholder");
            ModelPart::Text(format!("[Attachment not found at {}]", reference.file_uri))
        }
    }
}

/// Reads a current-turn attachment. Unlike [`hydrate`], an unreadable
/// reference is dropped from the turn entirely (no placeholder).
pub async fn load_attachment(reference: &FileReference) -> Option<ModelPart> {
    match tokio::fs::read(&reference.file_uri).await {
        Ok(data) => Some(ModelPart::Blob {
            mime_type: reference.mime_type.clone(),
            data,
        }),
        Err(e) => {
            warn!(uri = %reference.file_uri, error = %e, "submitted attachment unreadable, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_families_are_allowed() {
        assert!(is_allowed_mime("image/png"));
        assert!(is_allowed_mime("video/mp4"));
        assert!(is_allowed_mime("audio/ogg"));
    }

    #[test]
    fn anything_containing_text_is_allowed() {
        assert!(is_allowed_mime("text/plain"));
        assert!(is_allowed_mime("text/csv"));
        assert!(is_allowed_mime("application/text"));
    }

    #[test]
    fn exact_application_types_are_allowed() {
        assert!(is_allowed_mime("application/pdf"));
        assert!(is_allowed_mime("application/json"));
        assert!(is_allowed_mime("application/zip"));
    }

    #[test]
    fn other_types_are_rejected() {
        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_mime("application/octet-stream"));
        assert!(!is_allowed_mime(""));
    }

    #[tokio::test]
    async fn hydrate_reads_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        tokio::fs::write(&path, [0x89u8, 0x50]).await.unwrap();

        let reference = FileReference {
            mime_type: "image/png".into(),
            file_uri: path.to_string_lossy().into_owned(),
        };
        match hydrate(&reference).await {
            ModelPart::Blob { mime_type, data } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(data, vec![0x89, 0x50]);
            }
            other => panic!("expected Blob, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hydrate_degrades_to_placeholder_naming_the_uri() {
        let reference = FileReference {
            mime_type: "image/png".into(),
            file_uri: "uploads/deleted-file.png".into(),
        };
        match hydrate(&reference).await {
            ModelPart::Text(text) => {
                assert!(text.contains("uploads/deleted-file.png"));
                assert!(text.contains("not found"));
            }
            other => panic!("expected placeholder Text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_attachment_skips_missing_file() {
        let reference = FileReference {
            mime_type: "image/png".into(),
            file_uri: "uploads/never-existed.png".into(),
        };
        assert!(load_attachment(&reference).await.is_none());
    }
}
