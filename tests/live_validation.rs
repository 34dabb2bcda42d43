use docchat::{
    chat::{ChatMessage, ChatModel, OllamaChatClient},
    config::Config,
    ingest::{ChunkingConfig, Page, chunk_document},
    weaviate::WeaviateService,
};
use futures_util::StreamExt;

fn live_config() -> Config {
    dotenvy::dotenv().ok();
    Config::from_env().expect("configuration from environment")
}

#[tokio::test]
#[ignore = "Requires live Weaviate"]
async fn live_weaviate_ready_and_class_present() {
    let config = live_config();
    let store = WeaviateService::new(config.weaviate_settings()).expect("weaviate client");
    assert!(store.is_ready().await, "Weaviate should answer readiness");
    store
        .ensure_chunk_class()
        .await
        .expect("chunk class should exist or be creatable");
}

#[tokio::test]
#[ignore = "Requires live Weaviate with a vectorizer"]
async fn live_weaviate_accepts_chunk_batch() {
    let config = live_config();
    let store = WeaviateService::new(config.weaviate_settings()).expect("weaviate client");
    let pages = [Page::new("docchat live validation page", 1)];
    let chunks = chunk_document(&pages, "live-validation.pdf", &ChunkingConfig::default())
        .expect("chunks");
    store.insert_chunks(&chunks).await.expect("batch insert");
}

#[tokio::test]
#[ignore = "Requires live Ollama"]
async fn live_ollama_streams_reply() {
    let config = live_config();
    let client = OllamaChatClient::new(config.ollama_url.clone()).expect("ollama client");
    let mut stream = client
        .stream_chat(
            &config.chat_model,
            vec![ChatMessage::new("user", "Reply with a single word.")],
        )
        .await
        .expect("chat stream");
    let mut text = String::new();
    while let Some(delta) = stream.next().await {
        text.push_str(&delta.expect("delta"));
    }
    assert!(!text.trim().is_empty(), "model should produce text");
}
