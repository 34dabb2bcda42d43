//! Shared types used by the Weaviate client and helpers.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with Weaviate.
#[derive(Debug, Error)]
pub enum WeaviateError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Weaviate URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Weaviate responded with an unexpected status code.
    #[error("Unexpected Weaviate response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Weaviate.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Batch call succeeded at the HTTP level but some objects were rejected.
    #[error("{failed} object(s) rejected by Weaviate, first error: {first}")]
    ObjectErrors {
        /// Number of rejected objects in the batch.
        failed: usize,
        /// Message attached to the first rejected object.
        first: String,
    },
    /// GraphQL query returned errors.
    #[error("Weaviate GraphQL error: {0}")]
    GraphQl(String),
}

/// Connection and schema settings for [`super::WeaviateService`].
#[derive(Debug, Clone)]
pub struct WeaviateSettings {
    /// Base URL of the Weaviate REST endpoint.
    pub url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Optional key forwarded to the OpenAI vectorizer/generative modules.
    pub openai_api_key: Option<String>,
    /// Class holding document chunks.
    pub chunk_class: String,
    /// Vectorizer module configured on the chunk class.
    pub vectorizer: String,
    /// Generative module configured on the chunk class.
    pub generative_module: String,
}

impl WeaviateSettings {
    /// Settings for a local instance with the default modules.
    pub fn local(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            openai_api_key: None,
            chunk_class: "Chunks".into(),
            vectorizer: "text2vec-openai".into(),
            generative_module: "generative-openai".into(),
        }
    }
}

/// Object returned by the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredObject {
    /// UUID assigned to the object.
    pub id: String,
    /// Stored properties.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Deserialize)]
pub(crate) struct ObjectListResponse {
    #[serde(default)]
    pub(crate) objects: Vec<StoredObject>,
}

#[derive(Deserialize)]
pub(crate) struct BatchObjectResponse {
    #[serde(default)]
    pub(crate) result: Option<BatchObjectResult>,
}

#[derive(Deserialize)]
pub(crate) struct BatchObjectResult {
    #[serde(default)]
    pub(crate) errors: Option<ErrorList>,
}

#[derive(Deserialize)]
pub(crate) struct ErrorList {
    #[serde(default)]
    pub(crate) error: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ErrorMessage {
    pub(crate) message: String,
}

#[derive(Deserialize)]
pub(crate) struct GraphQlResponse {
    #[serde(default)]
    pub(crate) data: Option<Value>,
    #[serde(default)]
    pub(crate) errors: Option<Vec<ErrorMessage>>,
}
