//! Completion adapter: a background task that talks to one engine and
//! reports progress over a channel.
//!
//! A request produces a lazy, finite, non-restartable sequence of text
//! fragments consumed by exactly one reader (the chat loop). The
//! concatenation of all fragments is the canonical content persisted to the
//! session. Every event carries the stream id it belongs to so the consumer
//! can drop frames from superseded requests.

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ChatCompletionResponse, ChatMessage, ChatRequest, ChatStreamResponse};
use crate::core::engine::ResolvedEngine;
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub engine: ResolvedEngine,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Whether to request SSE delivery. Non-streaming responses are emitted
    /// as a single chunk followed by `End`.
    pub streaming: bool,
    /// Vision requests switch the engine to its vision-capable model.
    pub has_attachment: bool,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(
    payload: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    if payload == "[DONE]" {
        let _ = tx.send((StreamMessage::End, stream_id));
        return true;
    }

    match serde_json::from_str::<ChatStreamResponse>(payload) {
        Ok(frame) => {
            if let Some(content) = frame
                .choices
                .first()
                .and_then(|choice| choice.delta.content.as_ref())
            {
                let _ = tx.send((StreamMessage::Chunk(content.clone()), stream_id));
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

fn process_sse_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, tx, stream_id))
        .unwrap_or(false)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Format a raw provider failure for display in the transcript: JSON bodies
/// are pretty-printed with a one-line summary when one can be extracted.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "Engine error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value).filter(|s| !s.is_empty()) {
                return format!("Engine error: {summary}\n```json\n{pretty}\n```");
            }
            return format!("Engine error:\n```json\n{pretty}\n```");
        }
    }

    format!("Engine error:\n```\n{trimmed}\n```")
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire one completion request against the engine in `params`. Progress
    /// and termination arrive on the channel handed out by [`Self::new`].
    pub fn spawn_request(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                engine,
                messages,
                temperature,
                max_tokens,
                streaming,
                has_attachment,
                cancel_token,
                stream_id,
            } = params;

            let request = ChatRequest {
                model: engine.model_for(has_attachment),
                messages,
                stream: streaming,
                temperature,
                max_tokens,
            };

            debug!(
                engine = engine.engine.id,
                model = %request.model,
                streaming,
                stream_id,
                "dispatching completion request"
            );

            tokio::select! {
                _ = run_request(client, engine, request, tx.clone(), stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "completion request superseded");
                }
            }
        });
    }

}

async fn run_request(
    client: reqwest::Client,
    engine: ResolvedEngine,
    request: ChatRequest,
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    let chat_url = construct_api_url(engine.engine.base_url, "chat/completions");
    let streaming = request.stream;

    let response = match client
        .post(chat_url)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", engine.api_key))
        .json(&request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send((StreamMessage::Error(format_api_error(&e.to_string())), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        debug!(%status, stream_id, "completion request failed");
        let _ = tx.send((StreamMessage::Error(format_api_error(&error_text)), stream_id));
        let _ = tx.send((StreamMessage::End, stream_id));
        return;
    }

    if !streaming {
        match response.json::<ChatCompletionResponse>().await {
            Ok(body) => {
                if let Some(content) = body
                    .choices
                    .first()
                    .and_then(|choice| choice.message.content.clone())
                {
                    let _ = tx.send((StreamMessage::Chunk(content), stream_id));
                }
                let _ = tx.send((StreamMessage::End, stream_id));
            }
            Err(e) => {
                let _ =
                    tx.send((StreamMessage::Error(format_api_error(&e.to_string())), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
            }
        }
        return;
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let Ok(chunk_bytes) = chunk else {
            let _ = tx.send((
                StreamMessage::Error(format_api_error("stream interrupted")),
                stream_id,
            ));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        };
        buffer.extend_from_slice(&chunk_bytes);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(s) => s.trim().to_string(),
                Err(_) => {
                    buffer.drain(..=newline_pos);
                    continue;
                }
            };
            buffer.drain(..=newline_pos);

            if process_sse_line(&line, &tx, stream_id) {
                return;
            }
        }
    }

    let _ = tx.send((StreamMessage::End, stream_id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_lines_tolerate_spacing_variants() {
        let (service, mut rx) = ChatStreamService::new();
        let variants = [
            (r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#, "Hello", "data: [DONE]"),
            (r#"data:{"choices":[{"delta":{"content":"World"}}]}"#, "World", "data:[DONE]"),
        ];

        for (index, (chunk_line, expected, done_line)) in variants.iter().enumerate() {
            let stream_id = (index + 1) as u64;

            assert!(!process_sse_line(chunk_line, &service.tx, stream_id));
            let (message, id) = rx.try_recv().expect("expected chunk");
            assert_eq!(id, stream_id);
            match message {
                StreamMessage::Chunk(content) => assert_eq!(content, *expected),
                other => panic!("expected chunk, got {other:?}"),
            }

            assert!(process_sse_line(done_line, &service.tx, stream_id));
            let (message, id) = rx.try_recv().expect("expected end");
            assert_eq!(id, stream_id);
            assert!(matches!(message, StreamMessage::End));
        }

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_data_lines_are_ignored() {
        let (service, mut rx) = ChatStreamService::new();
        assert!(!process_sse_line("", &service.tx, 1));
        assert!(!process_sse_line(": keep-alive", &service.tx, 1));
        assert!(!process_sse_line("event: ping", &service.tx, 1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_payloads_become_error_then_end() {
        let (service, mut rx) = ChatStreamService::new();
        let error_line = r#"data: {"error":{"message":"internal server error"}}"#;

        assert!(process_sse_line(error_line, &service.tx, 9));

        let (message, id) = rx.try_recv().expect("expected error");
        assert_eq!(id, 9);
        match message {
            StreamMessage::Error(text) => {
                assert!(text.starts_with("Engine error: internal server error"));
                assert!(text.contains("```json"));
            }
            other => panic!("expected error, got {other:?}"),
        }

        let (message, _) = rx.try_recv().expect("expected end");
        assert!(matches!(message, StreamMessage::End));
    }

    #[test]
    fn format_api_error_extracts_json_summaries() {
        let raw = r#"{"error":{"message":"model overloaded","type":"invalid_request_error"}}"#;
        let formatted = format_api_error(raw);
        assert!(formatted.starts_with("Engine error: model overloaded"));
        assert!(formatted.contains("\"type\": \"invalid_request_error\""));
    }

    #[test]
    fn format_api_error_handles_plaintext_and_empty() {
        assert_eq!(
            format_api_error("connection refused"),
            "Engine error:\n```\nconnection refused\n```"
        );
        assert_eq!(format_api_error("   "), "Engine error:\n```\n<empty>\n```");
    }
}
