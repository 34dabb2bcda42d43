//! Ingestion service coordinating upload storage, extraction, chunking, and batch inserts.

use crate::{
    ingest::{
        batching::{BatchInsertError, ChunkSink, batch_insert},
        chunk_log::write_chunk_log,
        chunking::{ChunkingConfig, chunk_document},
        extract::extract_pages,
        types::{ChunkingError, DocumentSummary, IngestError, IngestOutcome, Page},
    },
    metrics::{IngestMetrics, MetricsSnapshot},
    weaviate::{WeaviateError, WeaviateService},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Abstraction over the ingestion pipeline used by the HTTP surface.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Store an uploaded PDF, chunk it, and insert the chunks.
    async fn ingest_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestOutcome, IngestError>;

    /// Summarise the documents already stored.
    async fn document_summary(&self) -> Result<DocumentSummary, IngestError>;

    /// Report whether the vector store is ready to accept requests.
    async fn store_ready(&self) -> bool;

    /// Retrieve the current metrics snapshot.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Store-side operations beyond batch inserts needed by [`IngestService`].
#[async_trait]
pub trait DocumentStore: ChunkSink<Error = WeaviateError> {
    /// Count stored chunks and list their source files.
    async fn document_summary(&self) -> Result<DocumentSummary, WeaviateError>;

    /// Readiness probe.
    async fn is_ready(&self) -> bool;
}

#[async_trait]
impl DocumentStore for WeaviateService {
    async fn document_summary(&self) -> Result<DocumentSummary, WeaviateError> {
        WeaviateService::document_summary(self).await
    }

    async fn is_ready(&self) -> bool {
        WeaviateService::is_ready(self).await
    }
}

/// Runs the upload → extract → chunk → insert pipeline against a caller-supplied store.
pub struct IngestService<S> {
    store: S,
    chunking: ChunkingConfig,
    batch_size: usize,
    upload_dir: PathBuf,
    metrics: Arc<IngestMetrics>,
}

impl<S: DocumentStore> IngestService<S> {
    /// Build a service, validating the chunk geometry and batch size up front.
    pub fn new(
        store: S,
        chunking: ChunkingConfig,
        batch_size: usize,
        upload_dir: impl Into<PathBuf>,
    ) -> Result<Self, ChunkingError> {
        chunking.validate()?;
        if batch_size == 0 {
            return Err(ChunkingError::ZeroBatchSize);
        }
        Ok(Self {
            store,
            chunking,
            batch_size,
            upload_dir: upload_dir.into(),
            metrics: Arc::new(IngestMetrics::new()),
        })
    }

    /// Directory that holds the most recent upload and its chunk log.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Replace the upload directory contents with `bytes`, then ingest the PDF.
    pub async fn ingest_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestOutcome, IngestError> {
        let file_name = sanitize_file_name(file_name)?;
        tracing::info!(file = %file_name, bytes = bytes.len(), "Processing upload");

        self.reset_upload_dir().await?;
        let stored_path = self.upload_dir.join(&file_name);
        tokio::fs::write(&stored_path, &bytes).await?;
        tracing::debug!(path = %stored_path.display(), "Upload stored");

        let pages = extract_pages(&bytes)?;
        let chunks = chunk_document(&pages, &file_name, &self.chunking)?;
        write_chunk_log(&self.upload_dir, &chunks).await?;
        self.submit(&file_name, pages.len(), chunks).await
    }

    /// Chunk already extracted pages and insert them without touching the upload directory.
    pub async fn ingest_pages(
        &self,
        file_name: &str,
        pages: &[Page],
    ) -> Result<IngestOutcome, IngestError> {
        let file_name = sanitize_file_name(file_name)?;
        let chunks = chunk_document(pages, &file_name, &self.chunking)?;
        self.submit(&file_name, pages.len(), chunks).await
    }

    async fn submit(
        &self,
        file_name: &str,
        page_count: usize,
        chunks: Vec<crate::ingest::ChunkRecord>,
    ) -> Result<IngestOutcome, IngestError> {
        let chunk_count = chunks.len();
        let inserted = batch_insert(&self.store, &chunks, self.batch_size)
            .await
            .map_err(|error| match error {
                BatchInsertError::Configuration(error) => IngestError::Configuration(error),
                BatchInsertError::Submission { submitted, source } => {
                    self.metrics.record_partial(submitted as u64);
                    IngestError::Submission { submitted, source }
                }
            })?;

        self.metrics.record_document(inserted as u64);
        let total_pages = u32::try_from(page_count).unwrap_or(u32::MAX);
        tracing::info!(
            file = file_name,
            total_pages,
            chunks = chunk_count,
            inserted,
            "Document ingested"
        );

        Ok(IngestOutcome {
            file_name: file_name.to_string(),
            total_pages,
            chunk_count,
            inserted,
        })
    }

    async fn reset_upload_dir(&self) -> Result<(), std::io::Error> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let mut entries = tokio::fs::read_dir(&self.upload_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                tracing::debug!(path = %entry.path().display(), "Removed previous upload");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> IngestApi for IngestService<S> {
    async fn ingest_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestOutcome, IngestError> {
        IngestService::ingest_upload(self, file_name, bytes).await
    }

    async fn document_summary(&self) -> Result<DocumentSummary, IngestError> {
        Ok(self.store.document_summary().await?)
    }

    async fn store_ready(&self) -> bool {
        self.store.is_ready().await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Reduce an uploaded file name to a safe basename.
pub(crate) fn sanitize_file_name(file_name: &str) -> Result<String, IngestError> {
    let normalized = file_name.replace('\\', "/");
    let base = normalized.rsplit('/').next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(IngestError::InvalidFileName(file_name.to_string()));
    }
    Ok(base.to_string())
}
