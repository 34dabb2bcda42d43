//! Routes chat turns to the language model or to document-grounded generation.

use super::{
    ollama::ChatModel,
    prompts::{NO_DOCUMENT_ANSWER, document_task, system_prompt},
    types::{ChatError, ChatMessage, ChatReply, ChatRequest},
};
use crate::weaviate::{WeaviateError, WeaviateService};
use async_trait::async_trait;
use std::sync::Arc;

/// Abstraction over the chat pipeline used by the HTTP surface.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Answer the latest turn of `request`.
    async fn respond(&self, request: ChatRequest) -> Result<ChatReply, ChatError>;
}

/// Generative search over stored document chunks.
#[async_trait]
pub trait GroundedGenerator: Send + Sync {
    /// Retrieve the chunks nearest to `query` and answer `task` over them.
    async fn generate_grouped(
        &self,
        query: &str,
        task: &str,
        limit: usize,
    ) -> Result<Option<String>, WeaviateError>;
}

#[async_trait]
impl GroundedGenerator for WeaviateService {
    async fn generate_grouped(
        &self,
        query: &str,
        task: &str,
        limit: usize,
    ) -> Result<Option<String>, WeaviateError> {
        WeaviateService::generate_grouped(self, query, task, limit).await
    }
}

/// Model selection and retrieval settings for [`ChatService`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Model used for plain chat.
    pub chat_model: String,
    /// Model used when the caller asks for step-by-step reasoning.
    pub reasoning_model: String,
    /// Chunks retrieved per document question.
    pub search_limit: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            chat_model: "llama3.2".into(),
            reasoning_model: "deepseek-r1:8b".into(),
            search_limit: 3,
        }
    }
}

/// Chat pipeline over explicit model and document-store handles.
pub struct ChatService {
    model: Arc<dyn ChatModel>,
    documents: Arc<dyn GroundedGenerator>,
    settings: ChatSettings,
}

impl ChatService {
    /// Build the service from caller-owned collaborators.
    pub fn new(
        model: Arc<dyn ChatModel>,
        documents: Arc<dyn GroundedGenerator>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            model,
            documents,
            settings,
        }
    }

    /// Answer from stored documents when files are selected, otherwise stream a model reply.
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let Some(latest) = request.chats.last() else {
            return Err(ChatError::EmptyHistory);
        };

        if request.wants_documents() {
            let task = document_task(&request.chats);
            tracing::info!(
                files = ?request.file_names,
                limit = self.settings.search_limit,
                "Answering from documents"
            );
            let answer = self
                .documents
                .generate_grouped(&latest.content, &task, self.settings.search_limit)
                .await?;
            return Ok(ChatReply::Text(
                answer.unwrap_or_else(|| NO_DOCUMENT_ANSWER.to_string()),
            ));
        }

        let model = if request.deep_seek {
            &self.settings.reasoning_model
        } else {
            &self.settings.chat_model
        };
        let persona = system_prompt(request.system_prompt.as_deref());
        let mut messages = Vec::with_capacity(request.chats.len() + 1);
        messages.push(ChatMessage::new("system", persona));
        messages.extend(request.chats);

        tracing::info!(
            model = %model,
            persona = request.system_prompt.as_deref().unwrap_or("default"),
            turns = messages.len() - 1,
            "Streaming chat reply"
        );
        let stream = self.model.stream_chat(model, messages).await?;
        Ok(ChatReply::Stream(stream))
    }
}

#[async_trait]
impl ChatApi for ChatService {
    async fn respond(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        ChatService::respond(self, request).await
    }
}
