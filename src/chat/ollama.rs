//! Streaming chat completions from a local Ollama runtime.
//!
//! `POST /api/chat` with `stream: true` answers with newline-delimited JSON frames, each carrying
//! a `message.content` delta. Frames may be split across network reads, so bytes are buffered
//! until a newline arrives.

use super::types::{ChatError, ChatMessage, TextStream};
use async_stream::try_stream;
use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Interface implemented by chat-capable language model backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start a streamed completion of `messages` with `model`.
    async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<TextStream, ChatError>;
}

/// Ollama-backed chat client issuing HTTP requests directly to the runtime.
pub struct OllamaChatClient {
    http: Client,
    base_url: String,
}

impl OllamaChatClient {
    /// Build a client for the runtime at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatError> {
        let http = Client::builder().user_agent("docchat/chat").build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatFrame {
    #[serde(default)]
    message: Option<FrameMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FrameMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ChatModel for OllamaChatClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<TextStream, ChatError> {
        tracing::debug!(model, messages = messages.len(), "Starting chat completion");
        let response = self
            .http
            .post(self.endpoint())
            .json(&json!({
                "model": model,
                "messages": messages,
                "stream": true,
            }))
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(url = %self.base_url, error = %error, "Ollama unreachable");
                ChatError::Http(error)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(model, status = %status, "Chat completion rejected");
            return Err(ChatError::UnexpectedStatus { status, body });
        }

        Ok(Box::pin(frame_deltas(response.bytes_stream())))
    }
}

/// Re-chunk a byte stream into NDJSON frames and yield their content deltas.
fn frame_deltas<S, B>(bytes: S) -> impl Stream<Item = Result<String, ChatError>> + Send
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(piece) = bytes.next().await {
            buffer.extend_from_slice(piece?.as_ref());
            while let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                if let Some(delta) = parse_frame(&line)? {
                    yield delta;
                }
            }
        }
        if let Some(delta) = parse_frame(&buffer)? {
            yield delta;
        }
    }
}

/// Decode one NDJSON frame into its content delta; blank lines and empty deltas yield `None`.
fn parse_frame(line: &[u8]) -> Result<Option<String>, ChatError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let frame: ChatFrame = serde_json::from_slice(line)
        .map_err(|error| ChatError::Provider(format!("malformed stream frame: {error}")))?;
    if let Some(error) = frame.error {
        return Err(ChatError::Provider(error));
    }
    Ok(frame
        .message
        .map(|message| message.content)
        .filter(|content| !content.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[test]
    fn parse_frame_extracts_content() {
        let frame = br#"{"message":{"role":"assistant","content":"Ahoy"},"done":false}"#;
        assert_eq!(parse_frame(frame).unwrap().as_deref(), Some("Ahoy"));
        assert_eq!(parse_frame(br#"{"done":true}"#).unwrap(), None);
        assert_eq!(parse_frame(b"  \n").unwrap(), None);
    }

    #[test]
    fn parse_frame_surfaces_provider_errors() {
        let error = parse_frame(br#"{"error":"model not found"}"#).unwrap_err();
        assert!(matches!(error, ChatError::Provider(message) if message == "model not found"));
        assert!(parse_frame(b"{not json").is_err());
    }

    #[tokio::test]
    async fn frames_split_across_reads_are_reassembled() {
        let pieces: Vec<Result<&'static [u8], reqwest::Error>> = vec![
            Ok(b"{\"message\":{\"content\":\"Ah".as_slice()),
            Ok(b"oy\"}}\n{\"message\":".as_slice()),
            Ok(b"{\"content\":\" matey\"},\"done\":true}".as_slice()),
        ];
        let deltas: Vec<String> = frame_deltas(futures_util::stream::iter(pieces))
            .map(|delta| delta.expect("delta"))
            .collect()
            .await;
        assert_eq!(deltas, vec!["Ahoy", " matey"]);
    }

    #[tokio::test]
    async fn stream_chat_relays_deltas() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .body_contains("\"model\":\"llama3.2\"")
                    .body_contains("\"stream\":true");
                then.status(200).body(
                    "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n\
                     {\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n\
                     {\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
                );
            })
            .await;

        let client = OllamaChatClient::new(server.base_url()).unwrap();
        let mut stream = client
            .stream_chat("llama3.2", vec![ChatMessage::new("user", "hi")])
            .await
            .expect("stream");
        let mut text = String::new();
        while let Some(delta) = stream.next().await {
            text.push_str(&delta.expect("delta"));
        }

        mock.assert();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn stream_chat_reports_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(404).body("model missing");
            })
            .await;

        let client = OllamaChatClient::new(server.base_url()).unwrap();
        let error = client
            .stream_chat("ghost", vec![ChatMessage::new("user", "hi")])
            .await
            .err()
            .expect("error");
        assert!(matches!(error, ChatError::UnexpectedStatus { status, .. } if status.as_u16() == 404));
    }
}
