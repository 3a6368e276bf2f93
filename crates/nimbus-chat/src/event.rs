// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed events emitted to the chat client during a streamed turn.

use nimbus_core::Usage;
use serde::Serialize;

/// One event on the outward chat stream.
///
/// Serialized shapes match what the browser consumes from the `data:`
/// lines of the event stream: `thoughts` and `answer` events carry the
/// fragment text plus the usage snapshot current at emission time; exactly
/// one terminal `done` or `error` event ends every stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Thoughts { content: String, usage: Usage },
    Answer { content: String, usage: Usage },
    Done { new_title: String, usage: Usage },
    Error { content: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_event_shape() {
        let event = ChatEvent::Answer {
            content: "Hi".into(),
            usage: Usage {
                prompt_tokens: 5,
                completion_tokens: 1,
                thoughts_tokens: 0,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "answer");
        assert_eq!(json["content"], "Hi");
        assert_eq!(json["usage"]["prompt_tokens"], 5);
    }

    #[test]
    fn thoughts_event_shape() {
        let event = ChatEvent::Thoughts {
            content: "mulling".into(),
            usage: Usage::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "thoughts");
        assert_eq!(json["usage"]["thoughts_tokens"], 0);
    }

    #[test]
    fn done_event_shape() {
        let event = ChatEvent::Done {
            new_title: "Weather talk".into(),
            usage: Usage::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "done");
        assert_eq!(json["new_title"], "Weather talk");
    }

    #[test]
    fn error_event_shape() {
        let event = ChatEvent::Error {
            content: "provider error: boom".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert!(json.get("usage").is_none());
    }
}
