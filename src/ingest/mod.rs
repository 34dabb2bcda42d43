//! Document ingestion pipeline: extraction, chunking, and batched inserts.

pub mod batching;
pub mod chunk_log;
pub mod chunking;
pub mod extract;
mod service;
pub mod types;

pub use batching::{BatchInsertError, ChunkSink, DEFAULT_BATCH_SIZE, batch_insert};
pub use chunking::{ChunkingConfig, chunk_document};
pub use extract::extract_pages;
pub use service::{DocumentStore, IngestApi, IngestService};
pub use types::{
    ChunkRecord, ChunkingError, DocumentSummary, ExtractionError, IngestError, IngestOutcome, Page,
};
