use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use docchat::{
    api,
    chat::{ChatService, ChatSettings, OllamaChatClient},
    ingest::{ChunkingConfig, IngestApi, IngestError, IngestService, Page},
    weaviate::{WeaviateService, WeaviateSettings},
};
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use regex::Regex;
use serde_json::{Value, json};
use tower::ServiceExt;

fn weaviate(server: &MockServer) -> WeaviateService {
    WeaviateService::new(WeaviateSettings::local(server.base_url())).expect("weaviate client")
}

fn ingest_service(server: &MockServer, dir: &std::path::Path) -> IngestService<WeaviateService> {
    IngestService::new(
        weaviate(server),
        ChunkingConfig::new(10, 2).expect("chunking"),
        2,
        dir,
    )
    .expect("ingest service")
}

fn pages() -> Vec<Page> {
    vec![Page::new("abcdefghijklmnop", 1), Page::new("xyz", 2)]
}

#[tokio::test]
async fn pages_are_inserted_in_sequential_batches() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/batch/objects")
                .body_contains("\"chunk_index\":0")
                .body_contains("\"chunk_index\":1");
            then.status(200).json_body(json!([{ "result": {} }, { "result": {} }]));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/batch/objects")
                .body_contains("\"chunk_index\":2")
                .body_contains("\"chunk_text\":\"xyz\"")
                .body_contains("\"page_number\":2");
            then.status(200).json_body(json!([{ "result": {} }]));
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let service = ingest_service(&server, dir.path());
    let outcome = service
        .ingest_pages("uploads/report.pdf", &pages())
        .await
        .expect("ingest");

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(outcome.file_name, "report.pdf");
    assert_eq!(outcome.total_pages, 2);
    assert_eq!(outcome.chunk_count, 3);
    assert_eq!(outcome.inserted, 3);
    assert_eq!(service.metrics_snapshot().chunks_ingested, 3);
}

#[tokio::test]
async fn rejected_batch_reports_chunks_already_stored() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/batch/objects")
                .body_contains("\"chunk_index\":0");
            then.status(200).json_body(json!([{ "result": {} }, { "result": {} }]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/batch/objects")
                .body_contains("\"chunk_index\":2");
            then.status(200).json_body(json!([{
                "result": { "errors": { "error": [{ "message": "vectorizer quota exceeded" }] } }
            }]));
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let service = ingest_service(&server, dir.path());
    let error = service
        .ingest_pages("report.pdf", &pages())
        .await
        .expect_err("second batch must fail");

    match error {
        IngestError::Submission { submitted, source } => {
            assert_eq!(submitted, 2);
            assert!(source.to_string().contains("vectorizer quota exceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.failed_documents, 1);
    assert_eq!(snapshot.chunks_ingested, 2);
}

#[tokio::test]
async fn missing_chunk_class_is_created() {
    let server = MockServer::start_async().await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_matches(Regex::new(r"^/v1/schema/[A-Z]\w*$").expect("regex"));
            then.status(404);
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/schema")
                .body_contains("\"class\":\"Chunks\"")
                .body_contains("\"vectorizer\":\"text2vec-openai\"")
                .body_contains("generative-openai");
            then.status(200).json_body(json!({ "class": "Chunks" }));
        })
        .await;

    weaviate(&server)
        .ensure_chunk_class()
        .await
        .expect("class created");

    lookup.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn files_route_lists_stored_documents() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/objects").query_param("class", "Chunks");
            then.status(200).json_body(json!({
                "objects": [
                    { "id": "00000000-0000-0000-0000-000000000001", "properties": { "file_name": "b.pdf" } },
                    { "id": "00000000-0000-0000-0000-000000000002", "properties": { "file_name": "a.pdf" } },
                    { "id": "00000000-0000-0000-0000-000000000003", "properties": { "file_name": "b.pdf" } }
                ]
            }));
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = weaviate(&server);
    let chat = ChatService::new(
        Arc::new(OllamaChatClient::new(server.base_url()).expect("ollama client")),
        Arc::new(store.clone()),
        ChatSettings::default(),
    );
    let ingest = IngestService::new(store, ChunkingConfig::default(), 100, dir.path())
        .expect("ingest service");
    let app = api::create_router(Arc::new(ingest), Arc::new(chat));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/files")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json, json!({ "count": 3, "fileNames": ["a.pdf", "b.pdf"] }));
}
