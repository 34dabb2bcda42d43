//! HTTP surface for the document chat server.
//!
//! - `POST /upload` – Multipart upload of one PDF (field `file`). The previous upload is
//!   replaced, the document is chunked, and the chunks are inserted into Weaviate. Returns the
//!   ingestion outcome (`fileName`, `totalPages`, `chunkCount`, `inserted`).
//! - `GET /files` – Number of stored chunks and the distinct source file names.
//! - `POST /api/chat` – Answer the latest chat turn, either as a complete document-grounded
//!   answer or as a stream of model text.
//! - `GET /readiness` – Whether Weaviate answers its readiness probe.
//! - `GET /metrics` – Ingestion counters.

use crate::chat::{ChatApi, ChatError, ChatReply, ChatRequest};
use crate::ingest::{DocumentSummary, IngestApi, IngestError, IngestOutcome};
use crate::metrics::MetricsSnapshot;
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures_util::TryStreamExt;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

const FILE_FIELD: &str = "file";

#[derive(Clone)]
struct AppState {
    ingest: Arc<dyn IngestApi>,
    chat: Arc<dyn ChatApi>,
}

/// Build the HTTP router over the ingestion and chat pipelines.
pub fn create_router(ingest: Arc<dyn IngestApi>, chat: Arc<dyn ChatApi>) -> Router {
    Router::new()
        .route("/upload", post(upload_document))
        .route("/files", get(list_files))
        .route("/api/chat", post(chat_reply))
        .route("/readiness", get(readiness))
        .route("/metrics", get(get_metrics))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(AppState { ingest, chat })
}

/// Store, chunk, and insert the uploaded PDF.
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestOutcome>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::BadRequest(error.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| AppError::BadRequest(error.body_text()))?;
        let outcome = state.ingest.ingest_upload(&file_name, bytes.to_vec()).await?;
        tracing::info!(
            file = %outcome.file_name,
            pages = outcome.total_pages,
            chunks = outcome.chunk_count,
            "Upload request completed"
        );
        return Ok(Json(outcome));
    }

    Err(AppError::BadRequest("No file uploaded".into()))
}

/// Summarise the documents currently stored.
async fn list_files(State(state): State<AppState>) -> Result<Json<DocumentSummary>, AppError> {
    Ok(Json(state.ingest.document_summary().await?))
}

/// Answer the latest chat turn.
async fn chat_reply(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let reply = state.chat.respond(request).await?;
    let body = match reply {
        ChatReply::Text(text) => Body::from(text),
        ChatReply::Stream(stream) => Body::from_stream(stream.inspect_err(|error| {
            tracing::error!(error = %error, "Chat stream aborted");
        })),
    };
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
}

async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        ready: state.ingest.store_ready().await,
    })
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.ingest.metrics_snapshot())
}

enum AppError {
    BadRequest(String),
    Ingest(IngestError),
    Chat(ChatError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Ingest(
                IngestError::InvalidFileName(_) | IngestError::Extraction(_),
            ) => StatusCode::BAD_REQUEST,
            Self::Ingest(IngestError::Submission { .. } | IngestError::Store(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Ingest(IngestError::Configuration(_) | IngestError::Storage(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Chat(ChatError::EmptyHistory) => StatusCode::BAD_REQUEST,
            Self::Chat(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(message) => message.clone(),
            Self::Ingest(error) => error.to_string(),
            Self::Chat(error) => error.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %message, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self::Ingest(inner)
    }
}

impl From<ChatError> for AppError {
    fn from(inner: ChatError) -> Self {
        Self::Chat(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::chat::{ChatApi, ChatError, ChatReply, ChatRequest};
    use crate::ingest::{
        DocumentSummary, ExtractionError, IngestApi, IngestError, IngestOutcome,
    };
    use crate::metrics::MetricsSnapshot;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use futures_util::stream;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubIngest {
        uploads: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl IngestApi for StubIngest {
        async fn ingest_upload(
            &self,
            file_name: &str,
            bytes: Vec<u8>,
        ) -> Result<IngestOutcome, IngestError> {
            if bytes.starts_with(b"garbage") {
                return Err(ExtractionError::Pdf("no pages".into()).into());
            }
            self.uploads
                .lock()
                .await
                .push((file_name.to_string(), bytes));
            Ok(IngestOutcome {
                file_name: file_name.to_string(),
                total_pages: 2,
                chunk_count: 5,
                inserted: 5,
            })
        }

        async fn document_summary(&self) -> Result<DocumentSummary, IngestError> {
            Ok(DocumentSummary {
                count: 7,
                file_names: vec!["report.pdf".into()],
            })
        }

        async fn store_ready(&self) -> bool {
            true
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 1,
                chunks_ingested: 5,
                failed_documents: 0,
                last_document_chunks: Some(5),
            }
        }
    }

    struct StubChat;

    #[async_trait]
    impl ChatApi for StubChat {
        async fn respond(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
            if request.chats.is_empty() {
                return Err(ChatError::EmptyHistory);
            }
            if request.wants_documents() {
                return Ok(ChatReply::Text("grounded answer".into()));
            }
            let deltas: Vec<Result<String, ChatError>> =
                vec![Ok("Ahoy".into()), Ok(", matey".into())];
            Ok(ChatReply::Stream(Box::pin(stream::iter(deltas))))
        }
    }

    fn app(ingest: Arc<StubIngest>) -> Router {
        create_router(ingest, Arc::new(StubChat))
    }

    fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
        let boundary = "docchat-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    fn chat_request(payload: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn upload_route_forwards_file_to_ingestion() {
        let ingest = Arc::new(StubIngest::default());
        let response = app(ingest.clone())
            .oneshot(multipart_request("file", "report.pdf", b"%PDF-1.4"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["fileName"], "report.pdf");
        assert_eq!(json["chunkCount"], 5);
        assert_eq!(json["totalPages"], 2);

        let uploads = ingest.uploads.lock().await;
        assert_eq!(uploads[0].0, "report.pdf");
        assert_eq!(uploads[0].1, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let response = app(Arc::new(StubIngest::default()))
            .oneshot(multipart_request("attachment", "report.pdf", b"%PDF"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("No file uploaded"));
    }

    #[tokio::test]
    async fn unreadable_pdf_maps_to_bad_request() {
        let response = app(Arc::new(StubIngest::default()))
            .oneshot(multipart_request("file", "broken.pdf", b"garbage"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn files_route_reports_summary() {
        let response = app(Arc::new(StubIngest::default()))
            .oneshot(
                Request::builder()
                    .uri("/files")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json, json!({ "count": 7, "fileNames": ["report.pdf"] }));
    }

    #[tokio::test]
    async fn chat_route_streams_model_text() {
        let response = app(Arc::new(StubIngest::default()))
            .oneshot(chat_request(json!({
                "chats": [{ "role": "user", "content": "hello" }],
                "systemPrompt": "Emoji Pirate"
            })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Ahoy, matey");
    }

    #[tokio::test]
    async fn chat_route_returns_document_answer() {
        let response = app(Arc::new(StubIngest::default()))
            .oneshot(chat_request(json!({
                "chats": [{ "role": "user", "content": "summarise" }],
                "fileNames": ["report.pdf"]
            })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "grounded answer");
    }

    #[tokio::test]
    async fn chat_route_rejects_empty_history() {
        let response = app(Arc::new(StubIngest::default()))
            .oneshot(chat_request(json!({ "chats": [] })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn readiness_and_metrics_routes_respond() {
        let router = app(Arc::new(StubIngest::default()));
        let ready = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/readiness")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(body_text(ready).await, r#"{"ready":true}"#);

        let metrics = router
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        let json: Value = serde_json::from_str(&body_text(metrics).await).unwrap();
        assert_eq!(json["documentsIngested"], 1);
        assert_eq!(json["lastDocumentChunks"], 5);
    }
}
