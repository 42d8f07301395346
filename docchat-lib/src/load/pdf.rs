use tracing::debug;

use crate::{Error, Result};

/// Text pulled out of a PDF
#[derive(Debug)]
pub(super) struct PdfText {
    /// Page texts joined with newlines
    pub text: String,
    /// Number of pages in the document, including skipped ones
    pub total: usize,
}

/// Extract text page by page. Pages without extractable text (scanned
/// images, broken content streams) are skipped.
pub(super) fn extract(bytes: &[u8]) -> Result<PdfText> {
    // pdf-extract panics on some malformed content streams
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| Error::Extraction("pdf parser panicked".to_string()))?
        .map_err(|e| Error::Extraction(format!("unreadable pdf: {e}")))?;

    Ok(join_pages(pages))
}

fn join_pages(pages: Vec<String>) -> PdfText {
    let total = pages.len();
    let kept: Vec<String> = pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, page)| {
            let page = page.trim();
            if page.is_empty() {
                debug!(page = i + 1, "no text on pdf page, skipping");
                None
            } else {
                Some(page.to_string())
            }
        })
        .collect();

    PdfText {
        text: kept.join("\n"),
        total,
    }
}
