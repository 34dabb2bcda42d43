//! Sequential, fixed-size batch submission of chunk records.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ChunkRecord, ChunkingError};

/// Default number of chunk records per insert call.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Downstream store that accepts ordered groups of chunk records.
///
/// Implementations persist (and typically embed) every record of a batch or fail the whole call.
/// Retrying is left to whoever drives [`batch_insert`].
#[async_trait]
pub trait ChunkSink: Send + Sync {
    /// Failure reported by the store for a single batch.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist one batch of records.
    async fn insert_batch(&self, batch: &[ChunkRecord]) -> Result<(), Self::Error>;
}

/// Errors returned by [`batch_insert`].
#[derive(Debug, Error)]
pub enum BatchInsertError<E: std::error::Error + 'static> {
    /// Batch size was rejected before anything was submitted.
    #[error(transparent)]
    Configuration(#[from] ChunkingError),
    /// A batch failed; earlier batches stay in the store.
    #[error("batch submission failed after {submitted} chunks: {source}")]
    Submission {
        /// Chunks accepted before the failing batch.
        submitted: usize,
        /// Failure reported by the sink.
        #[source]
        source: E,
    },
}

/// Submit `chunks` to `sink` in contiguous batches of at most `batch_size`, one at a time.
///
/// Returns the number of chunks submitted. The first failing batch aborts the run; nothing is
/// retried or rolled back. Dropping the returned future stops before the next batch.
pub async fn batch_insert<S>(
    sink: &S,
    chunks: &[ChunkRecord],
    batch_size: usize,
) -> Result<usize, BatchInsertError<S::Error>>
where
    S: ChunkSink + ?Sized,
{
    if batch_size == 0 {
        return Err(ChunkingError::ZeroBatchSize.into());
    }

    let total = chunks.len();
    let batch_count = total.div_ceil(batch_size);
    tracing::info!(
        chunks = total,
        batches = batch_count,
        batch_size,
        "Inserting chunk batches"
    );

    let mut submitted = 0;
    for (batch_number, batch) in chunks.chunks(batch_size).enumerate() {
        if let Err(source) = sink.insert_batch(batch).await {
            tracing::error!(
                batch = batch_number,
                first_failed_chunk = submitted,
                error = %source,
                "Chunk batch rejected"
            );
            return Err(BatchInsertError::Submission { submitted, source });
        }
        submitted += batch.len();
        tracing::info!(
            submitted,
            total,
            percent = submitted * 100 / total,
            "Chunk batch inserted"
        );
    }

    Ok(submitted)
}
