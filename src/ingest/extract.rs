//! PDF text extraction into per-page text.

use super::types::{ExtractionError, Page};

/// Extract the text layer of a PDF, one [`Page`] per PDF page.
///
/// Empty pages are kept so that the page count reflects the document; the chunker skips them.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<Page>, ExtractionError> {
    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|error| ExtractionError::Pdf(error.to_string()))?;
    let pages = number_pages(texts);
    tracing::debug!(
        pages = pages.len(),
        chars = pages.iter().map(|page| page.text.chars().count()).sum::<usize>(),
        "Extracted PDF text"
    );
    Ok(pages)
}

fn number_pages(texts: Vec<String>) -> Vec<Page> {
    texts
        .into_iter()
        .zip(1u32..)
        .map(|(text, page_number)| Page::new(text, page_number))
        .collect()
}
