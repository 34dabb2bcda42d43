//! Core data types and error definitions for the ingestion pipeline.

use crate::weaviate::WeaviateError;
use serde::Serialize;
use thiserror::Error;

/// Plain text of a single document page as produced by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Extracted page text, untrimmed.
    pub text: String,
    /// One-based page number.
    pub page_number: u32,
}

impl Page {
    /// Convenience constructor used by the extractor and tests.
    pub fn new(text: impl Into<String>, page_number: u32) -> Self {
        Self {
            text: text.into(),
            page_number,
        }
    }
}

/// A window of page text ready to be embedded by the vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    /// Chunk contents; never empty.
    pub text: String,
    /// Basename of the originating file.
    pub source_file_name: String,
    /// Page count of the source document at extraction time.
    pub total_pages: u32,
    /// Page the chunk was sliced from.
    pub page_number: u32,
    /// Zero-based position of the chunk across the whole document.
    pub chunk_index: usize,
}

/// Invalid chunking or batching parameters. Always raised before any chunk is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkingError {
    /// The window must hold at least one character.
    #[error("chunk window size must be greater than zero")]
    ZeroWindow,
    /// Overlap has to leave a positive step between windows.
    #[error("chunk overlap ({overlap}) must be smaller than the window size ({window})")]
    OverlapTooLarge {
        /// Configured overlap in characters.
        overlap: usize,
        /// Configured window size in characters.
        window: usize,
    },
    /// Batches must carry at least one chunk.
    #[error("batch size must be greater than zero")]
    ZeroBatchSize,
}

/// Errors raised while turning a PDF into pages.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The PDF parser rejected the document.
    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),
}

/// Errors emitted by the ingestion service.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload carried an unusable file name.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),
    /// Chunking or batching parameters were rejected.
    #[error("invalid chunking configuration: {0}")]
    Configuration(#[from] ChunkingError),
    /// PDF extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Upload directory or chunk log could not be written.
    #[error("upload storage failed: {0}")]
    Storage(#[from] std::io::Error),
    /// A batch was rejected by the vector store after `submitted` chunks had been accepted.
    #[error("batch insert failed after {submitted} chunks: {source}")]
    Submission {
        /// Chunks accepted before the failing batch.
        submitted: usize,
        /// Vector store failure.
        #[source]
        source: WeaviateError,
    },
    /// Vector store call outside batch submission failed.
    #[error("vector store request failed: {0}")]
    Store(#[from] WeaviateError),
}

/// Summary of a completed document ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    /// Basename the chunks were stored under.
    pub file_name: String,
    /// Pages reported by the extractor.
    pub total_pages: u32,
    /// Chunks produced by the chunker.
    pub chunk_count: usize,
    /// Chunks accepted by the vector store.
    pub inserted: usize,
}

/// Distinct documents currently stored in the chunk collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Total number of stored chunk objects.
    pub count: usize,
    /// Sorted, de-duplicated file names.
    pub file_names: Vec<String>,
}
