// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Title generation over a finished first exchange.
//!
//! Builds a role-tagged transcript from the conversation's text parts and
//! asks the provider for a structured one-shot summary. Failures propagate
//! to the caller, which applies the deterministic fallback — no fallback
//! happens here.

use nimbus_core::{GenerationProvider, NimbusError, Part};
use nimbus_store::{Conversation, TITLE_MAX_CHARS, truncate_chars};

/// Generates a short title for the conversation, capped at
/// [`TITLE_MAX_CHARS`] characters.
pub async fn generate_title(
    provider: &dyn GenerationProvider,
    conversation: &Conversation,
) -> Result<String, NimbusError> {
    let mut transcript = String::new();
    for message in &conversation.history {
        for part in &message.parts {
            if let Part::Text { text } = part {
                transcript.push_str(message.role.as_str());
                transcript.push_str(": ");
                transcript.push_str(text);
                transcript.push('\n');
            }
        }
    }

    let title = provider.generate_title(&transcript).await?;
    let title = title.trim();
    if title.is_empty() {
        return Err(NimbusError::provider("title generation returned an empty title"));
    }
    Ok(truncate_chars(title, TITLE_MAX_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::{Message, Usage};
    use nimbus_test_utils::MockProvider;

    fn conversation_with_exchange() -> Conversation {
        Conversation {
            title: "New Chat".into(),
            history: vec![
                Message::user(vec![Part::text("what is borrowck")]),
                Message::model("The borrow checker…", "", "gemini-2.5-flash", Usage::default()),
            ],
            created_at: 0.0,
        }
    }

    #[tokio::test]
    async fn transcript_is_role_tagged_text_only() {
        let provider = MockProvider::new();
        provider.push_title("Borrow checker basics");

        let mut conversation = conversation_with_exchange();
        conversation.history[0]
            .parts
            .push(Part::file("image/png", "uploads/x.png"));

        let title = generate_title(&provider, &conversation).await.unwrap();
        assert_eq!(title, "Borrow checker basics");

        let transcripts = provider.title_transcripts();
        assert_eq!(
            transcripts[0],
            "user: what is borrowck\nmodel: The borrow checker…\n"
        );
    }

    #[tokio::test]
    async fn long_titles_are_capped_at_fifty_characters() {
        let provider = MockProvider::new();
        provider.push_title("x".repeat(80));

        let title = generate_title(&provider, &conversation_with_exchange())
            .await
            .unwrap();
        assert_eq!(title.chars().count(), 50);
    }

    #[tokio::test]
    async fn empty_title_is_an_error_not_a_fallback() {
        let provider = MockProvider::new();
        provider.push_title("   ");

        let err = generate_title(&provider, &conversation_with_exchange())
            .await
            .unwrap_err();
        assert!(matches!(err, NimbusError::Provider { .. }));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = MockProvider::new();
        provider.push_title_error("title model unavailable");

        let err = generate_title(&provider, &conversation_with_exchange())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("title model unavailable"));
    }
}
