//! Request, reply, and error types for the chat pipeline.

use crate::weaviate::WeaviateError;
use futures_core::Stream;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

/// Streamed text deltas produced by a language model.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// One turn of the conversation as sent by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a message with the given role.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation so far; the last entry is the current question.
    #[serde(default)]
    pub chats: Vec<ChatMessage>,
    /// Persona name; unknown or missing names use the default persona.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Use the reasoning model instead of the default chat model.
    #[serde(default)]
    pub deep_seek: bool,
    /// Uploaded documents selected by the user; non-empty switches to document answers.
    #[serde(default)]
    pub file_names: Option<Vec<String>>,
}

impl ChatRequest {
    /// Whether the request should be answered from stored documents.
    pub fn wants_documents(&self) -> bool {
        self.file_names
            .as_ref()
            .is_some_and(|names| !names.is_empty())
    }
}

/// Answer returned to the HTTP layer.
pub enum ChatReply {
    /// Complete answer.
    Text(String),
    /// Incrementally generated answer.
    Stream(TextStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Errors emitted while answering a chat request.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request carried no messages.
    #[error("chat history must contain at least one message")]
    EmptyHistory,
    /// HTTP layer failed before or while receiving a response.
    #[error("language model request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The language model endpoint answered with an error status.
    #[error("language model returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Response body.
        body: String,
    },
    /// The provider reported an error or sent an unreadable frame.
    #[error("language model error: {0}")]
    Provider(String),
    /// Document-grounded generation failed.
    #[error("document search failed: {0}")]
    Store(#[from] WeaviateError),
}
