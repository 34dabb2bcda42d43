//! JSON audit log of the chunks produced for an upload.

use std::path::{Path, PathBuf};

use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use super::types::ChunkRecord;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChunkLog<'a> {
    total_chunks: usize,
    timestamp: &'a str,
    chunks: Vec<LoggedChunk<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoggedChunk<'a> {
    text: &'a str,
    file_name: &'a str,
    metadata: LoggedMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoggedMetadata {
    total_pages: u32,
    #[serde(rename = "pageNumberLocation")]
    page_number: u32,
    chunk_index: usize,
}

/// Write `chunks-log-<timestamp>.json` into `dir` and return its path.
pub async fn write_chunk_log(dir: &Path, chunks: &[ChunkRecord]) -> std::io::Result<PathBuf> {
    write_chunk_log_at(dir, chunks, OffsetDateTime::now_utc()).await
}

pub(crate) async fn write_chunk_log_at(
    dir: &Path,
    chunks: &[ChunkRecord],
    now: OffsetDateTime,
) -> std::io::Result<PathBuf> {
    let timestamp = now
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string());
    let log = ChunkLog {
        total_chunks: chunks.len(),
        timestamp: &timestamp,
        chunks: chunks
            .iter()
            .map(|chunk| LoggedChunk {
                text: &chunk.text,
                file_name: &chunk.source_file_name,
                metadata: LoggedMetadata {
                    total_pages: chunk.total_pages,
                    page_number: chunk.page_number,
                    chunk_index: chunk.chunk_index,
                },
            })
            .collect(),
    };

    let body = serde_json::to_vec_pretty(&log)?;
    let path = dir.join(log_file_name(&timestamp));
    tokio::fs::write(&path, body).await?;
    tracing::debug!(path = %path.display(), chunks = chunks.len(), "Chunk log written");
    Ok(path)
}

fn log_file_name(timestamp: &str) -> String {
    format!("chunks-log-{}.json", timestamp.replace([':', '.'], "-"))
}
