//! Fixed-size, overlapping character windows over extracted page text.
//!
//! Each page is treated as an independent text stream: windows never span a page boundary and
//! the offset resets to zero at the start of every page. Chunk indexes, on the other hand, run
//! across the whole document so that the stored records can be ordered without the page number.
//!
//! Sizes are measured in `char`s. Boundaries fall on raw offsets, so a window may cut a word in
//! half; text is never trimmed or normalised.

use std::path::Path;

use super::types::{ChunkRecord, ChunkingError, Page};

/// Rough budget of tokens per chunk for Llama-friendly embedding models.
const TARGET_CHUNK_TOKENS: usize = 400;
/// Tokens shared between consecutive chunks of the same page.
const OVERLAP_TOKENS: usize = 50;
/// Empirical average characters per token.
const CHARS_PER_TOKEN: usize = 4;

/// Default window size in characters.
pub const DEFAULT_WINDOW_SIZE_CHARS: usize = TARGET_CHUNK_TOKENS * CHARS_PER_TOKEN;
/// Default overlap in characters.
pub const DEFAULT_OVERLAP_CHARS: usize = OVERLAP_TOKENS * CHARS_PER_TOKEN;

/// Window geometry used by [`chunk_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub window_size_chars: usize,
    /// Characters shared by consecutive chunks of one page.
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size_chars: DEFAULT_WINDOW_SIZE_CHARS,
            overlap_chars: DEFAULT_OVERLAP_CHARS,
        }
    }
}

impl ChunkingConfig {
    /// Build a configuration, rejecting geometries that cannot make progress.
    pub fn new(window_size_chars: usize, overlap_chars: usize) -> Result<Self, ChunkingError> {
        let config = Self {
            window_size_chars,
            overlap_chars,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration without producing any chunks.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        self.step_chars().map(|_| ())
    }

    /// Distance between the starts of two consecutive windows.
    pub fn step_chars(&self) -> Result<usize, ChunkingError> {
        if self.window_size_chars == 0 {
            return Err(ChunkingError::ZeroWindow);
        }
        if self.overlap_chars >= self.window_size_chars {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: self.overlap_chars,
                window: self.window_size_chars,
            });
        }
        Ok(self.window_size_chars - self.overlap_chars)
    }
}

/// Split extracted pages into overlapping chunk records.
///
/// `file_name` may be a path; only its basename is stored. `total_pages` on every record is the
/// number of pages supplied, including empty ones. Empty pages contribute no chunks and do not
/// consume chunk indexes.
pub fn chunk_document(
    pages: &[Page],
    file_name: &str,
    config: &ChunkingConfig,
) -> Result<Vec<ChunkRecord>, ChunkingError> {
    let step = config.step_chars()?;
    let source_file_name = basename(file_name);
    let total_pages = u32::try_from(pages.len()).unwrap_or(u32::MAX);

    let mut chunks = Vec::new();
    for page in pages {
        for text in page_windows(&page.text, config.window_size_chars, step) {
            let chunk_index = chunks.len();
            chunks.push(ChunkRecord {
                text: text.to_string(),
                source_file_name: source_file_name.clone(),
                total_pages,
                page_number: page.page_number,
                chunk_index,
            });
        }
        tracing::trace!(
            page = page.page_number,
            chunks_so_far = chunks.len(),
            "Page chunked"
        );
    }

    tracing::debug!(
        file = %source_file_name,
        total_pages,
        chunks = chunks.len(),
        window = config.window_size_chars,
        overlap = config.overlap_chars,
        "Document chunked"
    );
    Ok(chunks)
}

/// Slice one page into windows of at most `window` chars, advancing by `step` chars.
///
/// Stops after the first window that reaches the end of the page, so a trailing window that
/// would lie entirely inside its predecessor is never emitted.
fn page_windows(text: &str, window: usize, step: usize) -> Vec<&str> {
    let boundaries: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    let len = boundaries.len();
    let byte_at = |char_offset: usize| boundaries.get(char_offset).copied().unwrap_or(text.len());

    let mut windows = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + window).min(len);
        windows.push(&text[byte_at(start)..byte_at(end)]);
        if end == len {
            break;
        }
        start += step;
    }
    windows
}

fn basename(file_name: &str) -> String {
    // Browsers on Windows occasionally send backslash-separated paths.
    let normalized = file_name.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}
