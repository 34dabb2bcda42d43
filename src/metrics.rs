use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_ingested: AtomicU64,
    chunks_ingested: AtomicU64,
    last_document_chunks: AtomicU64,
    failed_documents: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fully ingested document and the number of chunks stored for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_ingested.fetch_add(chunk_count, Ordering::Relaxed);
        self.last_document_chunks
            .store(chunk_count, Ordering::Relaxed);
    }

    /// Record a document whose insert aborted after `chunk_count` chunks were stored.
    pub fn record_partial(&self, chunk_count: u64) {
        self.failed_documents.fetch_add(1, Ordering::Relaxed);
        self.chunks_ingested.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last = self.last_document_chunks.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_ingested: self.chunks_ingested.load(Ordering::Relaxed),
            failed_documents: self.failed_documents.load(Ordering::Relaxed),
            last_document_chunks: (self.documents_ingested.load(Ordering::Relaxed) > 0)
                .then_some(last),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Documents fully ingested since startup.
    pub documents_ingested: u64,
    /// Chunks stored across all documents, including partially ingested ones.
    pub chunks_ingested: u64,
    /// Documents whose batch insert aborted midway.
    pub failed_documents: u64,
    /// Chunk count of the most recent fully ingested document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_document_chunks: Option<u64>,
}
