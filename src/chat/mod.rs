//! Conversational pipeline: persona chat via Ollama and document answers via Weaviate.

pub mod ollama;
pub mod prompts;
mod service;
pub mod types;

pub use ollama::{ChatModel, OllamaChatClient};
pub use service::{ChatApi, ChatService, ChatSettings, GroundedGenerator};
pub use types::{ChatError, ChatMessage, ChatReply, ChatRequest, TextStream};
