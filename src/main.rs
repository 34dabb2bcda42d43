use anyhow::{Context, Result};
use docchat::{
    api,
    chat::{ChatService, OllamaChatClient},
    config,
    ingest::IngestService,
    logging,
    weaviate::WeaviateService,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let config = config::init_config().context("Failed to load config from environment")?;

    let store = WeaviateService::new(config.weaviate_settings())
        .context("Failed to build Weaviate client")?;
    if let Err(error) = store.ensure_chunk_class().await {
        tracing::warn!(
            error = %error,
            class = store.chunk_class(),
            "Could not verify Weaviate chunk class; uploads will fail until it exists"
        );
    }

    let ingest = IngestService::new(
        store.clone(),
        config.chunking()?,
        config.ingest_batch_size,
        config.upload_dir.clone(),
    )?;
    let chat = ChatService::new(
        Arc::new(OllamaChatClient::new(config.ollama_url.clone())?),
        Arc::new(store),
        config.chat_settings(),
    );
    let app = api::create_router(Arc::new(ingest), Arc::new(chat));

    let (listener, port) = bind_listener(config.server_port)
        .await
        .context("Failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn bind_listener(server_port: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4100..=4199;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4100-4199",
    ))
}
