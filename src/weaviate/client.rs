//! HTTP client wrapper for interacting with Weaviate.

use crate::ingest::{ChunkRecord, ChunkSink, DocumentSummary};
use crate::weaviate::types::{
    BatchObjectResponse, GraphQlResponse, WeaviateError, WeaviateSettings,
};
use async_trait::async_trait;
use futures_util::{TryStreamExt, pin_mut};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Lightweight HTTP client for Weaviate operations.
#[derive(Clone)]
pub struct WeaviateService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) settings: WeaviateSettings,
}

impl WeaviateService {
    /// Construct a new client from explicit settings.
    pub fn new(settings: WeaviateSettings) -> Result<Self, WeaviateError> {
        let client = Client::builder().user_agent("docchat/0.1").build()?;
        let base_url = normalize_base_url(&settings.url).map_err(WeaviateError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            class = %settings.chunk_class,
            has_api_key = settings.api_key.as_deref().is_some_and(|key| !key.is_empty()),
            "Initialized Weaviate HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    /// Name of the class that stores document chunks.
    pub fn chunk_class(&self) -> &str {
        &self.settings.chunk_class
    }

    /// Report whether Weaviate answers its readiness probe.
    pub async fn is_ready(&self) -> bool {
        let response = match self.request(Method::GET, "v1/.well-known/ready").send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(error = %error, "Weaviate readiness probe failed");
                return false;
            }
        };
        let ready = response.status().is_success();
        tracing::debug!(ready, status = %response.status(), "Weaviate readiness probed");
        ready
    }

    /// Create the chunk class when it is missing.
    pub async fn ensure_chunk_class(&self) -> Result<(), WeaviateError> {
        let class = self.chunk_class();
        if self.class_exists(class).await? {
            tracing::debug!(class, "Chunk class present");
            return Ok(());
        }

        let mut module_config = serde_json::Map::new();
        module_config.insert(self.settings.generative_module.clone(), json!({}));
        let body = json!({
            "class": class,
            "description": "Overlapping text windows extracted from uploaded documents",
            "vectorizer": self.settings.vectorizer,
            "moduleConfig": module_config,
            "properties": [
                { "name": "chunk_text", "dataType": ["text"] },
                { "name": "file_name", "dataType": ["text"] },
                { "name": "total_pages", "dataType": ["int"] },
                { "name": "page_number", "dataType": ["int"] },
                { "name": "chunk_index", "dataType": ["int"] }
            ]
        });

        let response = self
            .request(Method::POST, "v1/schema")
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::info!(class, "Chunk class created");
        })
        .await
    }

    /// Insert one batch of chunk records into the chunk class.
    ///
    /// Object ids derive from the file name and chunk index, so re-submitting a batch replaces
    /// the earlier objects instead of duplicating them.
    pub async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> Result<(), WeaviateError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let class = self.chunk_class();
        let objects: Vec<Value> = chunks
            .iter()
            .map(|chunk| {
                json!({
                    "class": class,
                    "id": chunk_object_id(chunk).to_string(),
                    "properties": {
                        "chunk_text": chunk.text,
                        "file_name": chunk.source_file_name,
                        "total_pages": chunk.total_pages,
                        "page_number": chunk.page_number,
                        "chunk_index": chunk.chunk_index,
                    }
                })
            })
            .collect();

        let response = self
            .request(Method::POST, "v1/batch/objects")
            .json(&json!({ "objects": objects }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = WeaviateError::UnexpectedStatus { status, body };
            tracing::error!(class, error = %error, "Batch insert failed");
            return Err(error);
        }

        let results: Vec<BatchObjectResponse> = response.json().await?;
        let messages: Vec<String> = results
            .into_iter()
            .filter_map(|object| object.result.and_then(|result| result.errors))
            .flat_map(|errors| errors.error.into_iter().map(|error| error.message))
            .collect();

        if let Some(first) = messages.first() {
            let error = WeaviateError::ObjectErrors {
                failed: messages.len(),
                first: first.clone(),
            };
            tracing::error!(class, error = %error, "Batch insert partially rejected");
            return Err(error);
        }

        tracing::debug!(class, objects = chunks.len(), "Chunk batch stored");
        Ok(())
    }

    /// Count stored chunks and collect the distinct file names they came from.
    pub async fn document_summary(&self) -> Result<DocumentSummary, WeaviateError> {
        let stream = super::iterator::stream_objects(self, self.chunk_class());
        pin_mut!(stream);

        let mut count = 0;
        let mut file_names = BTreeSet::new();
        while let Some(object) = stream.try_next().await? {
            count += 1;
            if let Some(Value::String(name)) = object.properties.get("file_name") {
                file_names.insert(name.clone());
            }
        }

        Ok(DocumentSummary {
            count,
            file_names: file_names.into_iter().collect(),
        })
    }

    /// Run a `nearText` search and let the generative module answer `task` over the hits.
    ///
    /// Returns `None` when Weaviate produced no grouped result.
    pub async fn generate_grouped(
        &self,
        query: &str,
        task: &str,
        limit: usize,
    ) -> Result<Option<String>, WeaviateError> {
        let class = self.chunk_class();
        let graphql = build_grouped_query(class, query, task, limit);

        let response = self
            .request(Method::POST, "v1/graphql")
            .json(&json!({ "query": graphql }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = WeaviateError::UnexpectedStatus { status, body };
            tracing::error!(class, error = %error, "Generative search failed");
            return Err(error);
        }

        let payload: GraphQlResponse = response.json().await?;
        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .into_iter()
                .map(|error| error.message)
                .collect::<Vec<_>>()
                .join("; ");
            tracing::error!(class, error = %message, "Generative search returned errors");
            return Err(WeaviateError::GraphQl(message));
        }

        let generated = payload
            .data
            .as_ref()
            .and_then(|data| data.pointer(&format!("/Get/{class}")))
            .and_then(Value::as_array)
            .and_then(|hits| {
                hits.iter().find_map(|hit| {
                    hit.pointer("/_additional/generate/groupedResult")
                        .and_then(Value::as_str)
                })
            })
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        tracing::debug!(class, limit, generated = generated.is_some(), "Generative search done");
        Ok(generated)
    }

    async fn class_exists(&self, class: &str) -> Result<bool, WeaviateError> {
        let response = self
            .request(Method::GET, &format!("v1/schema/{class}"))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = WeaviateError::UnexpectedStatus { status, body };
                tracing::error!(class, error = %error, "Class existence check failed");
                Err(error)
            }
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.settings.api_key
            && !api_key.is_empty()
        {
            req = req.bearer_auth(api_key);
        }
        if let Some(openai_key) = &self.settings.openai_api_key
            && !openai_key.is_empty()
        {
            req = req.header("X-OpenAI-Api-Key", openai_key);
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), WeaviateError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = WeaviateError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Weaviate request failed");
            Err(error)
        }
    }
}

#[async_trait]
impl ChunkSink for WeaviateService {
    type Error = WeaviateError;

    async fn insert_batch(&self, batch: &[ChunkRecord]) -> Result<(), WeaviateError> {
        self.insert_chunks(batch).await
    }
}

/// Deterministic object id for a chunk.
pub fn chunk_object_id(chunk: &ChunkRecord) -> Uuid {
    let key = format!("{}#{}", chunk.source_file_name, chunk.chunk_index);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
}

fn build_grouped_query(class: &str, query: &str, task: &str, limit: usize) -> String {
    // JSON string literals are valid GraphQL string literals.
    let concepts = Value::String(query.to_string()).to_string();
    let task = Value::String(task.to_string()).to_string();
    format!(
        "{{ Get {{ {class}(nearText: {{concepts: [{concepts}]}}, limit: {limit}) {{ \
         chunk_text file_name _additional {{ generate(groupedResult: {{task: {task}}}) \
         {{ groupedResult error }} }} }} }} }}"
    )
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

pub(crate) fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
