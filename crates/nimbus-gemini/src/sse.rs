// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Gemini `streamGenerateContent?alt=sse` responses.
//!
//! Converts a reqwest response byte stream into [`GenerationChunk`]s using
//! the `eventsource-stream` crate for SSE protocol compliance. Each SSE
//! event's data is one JSON `GenerateContentResponse`.

use nimbus_core::{ChunkStream, NimbusError};
use eventsource_stream::Eventsource;
use futures::stream::StreamExt;

use crate::types::GenerateContentResponse;

/// Parses a streaming response into a stream of [`GenerationChunk`]s.
///
/// Events that flatten to neither fragments nor a usage snapshot are
/// silently skipped; malformed event payloads and transport errors surface
/// as stream errors and terminate the turn.
pub fn parse_sse_stream(response: reqwest::Response) -> ChunkStream {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::from_str::<GenerateContentResponse>(&event.data) {
                Ok(resp) => {
                    let chunk = resp.into_chunk();
                    if chunk.fragments.is_empty() && chunk.usage.is_none() {
                        None
                    } else {
                        Some(Ok(chunk))
                    }
                }
                Err(e) => Some(Err(NimbusError::Provider {
                    message: format!("failed to parse stream chunk: {e}"),
                    source: Some(Box::new(e)),
                })),
            },
            Err(e) => Some(Err(NimbusError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use nimbus_core::FragmentChannel;

    /// Serve raw SSE text through wiremock to get a real reqwest::Response.
    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn parses_answer_fragment() {
        let sse = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n";
        let response = mock_sse_response(sse).await;
        let mut stream = parse_sse_stream(response);

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragments.len(), 1);
        assert_eq!(chunk.fragments[0].channel, FragmentChannel::Answer);
        assert_eq!(chunk.fragments[0].text, "Hello");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn parses_thought_fragment_and_usage() {
        let sse = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"mull\",\"thought\":true}]}},",
            "{\"content\":{\"parts\":[{\"text\":\"ignored second candidate\"}]}}],",
            "\"usageMetadata\":{\"promptTokenCount\":3,\"thoughtsTokenCount\":2}}\n\n"
        );
        let response = mock_sse_response(sse).await;
        let mut stream = parse_sse_stream(response);

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragments.len(), 1, "only the first candidate counts");
        assert_eq!(chunk.fragments[0].channel, FragmentChannel::Thought);
        let usage = chunk.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 3);
        assert_eq!(usage.thoughts_tokens, 2);
    }

    #[tokio::test]
    async fn contentless_events_are_skipped() {
        let sse = concat!(
            "data: {\"candidates\":[{}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"kept\"}]}}]}\n\n"
        );
        let response = mock_sse_response(sse).await;
        let mut stream = parse_sse_stream(response);

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragments[0].text, "kept");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_payload_is_a_stream_error() {
        let sse = "data: {not json}\n\n";
        let response = mock_sse_response(sse).await;
        let mut stream = parse_sse_stream(response);

        let item = stream.next().await.unwrap();
        assert!(matches!(item, Err(NimbusError::Provider { .. })));
    }
}
