//! Best-effort plain-text extraction, independent of any AI tier.
//!
//! The contract is deliberate: this function **never fails**. Callers
//! treat an empty (or near-empty) result as "extraction failed" and
//! decide what to do next — there is no error channel, because every
//! consumer (the text tiers, the offline parser) already has a fallback
//! path and a `Result` here would just be unwrapped to `""` at every
//! call site anyway.
//!
//! PDFs are walked page by page with lopdf on a blocking thread; plain
//! text decodes as lossy UTF-8; images go through OCR.

use tracing::warn;

use crate::document::{DocumentKind, UploadedDocument};
use crate::ocr;

/// Extract the document's text content. Empty string on any failure.
pub async fn extract_text(doc: &UploadedDocument, ocr_language: &str) -> String {
    match doc.kind() {
        DocumentKind::Pdf => {
            let bytes = doc.bytes.clone();
            tokio::task::spawn_blocking(move || extract_pdf_text_blocking(&bytes))
                .await
                .unwrap_or_default()
        }
        DocumentKind::PlainText => String::from_utf8_lossy(&doc.bytes).to_string(),
        DocumentKind::Image(_) => ocr::recognize(&doc.bytes, ocr_language).await,
        DocumentKind::Other => String::new(),
    }
}

/// Walk every page in document order, joining pages with a newline.
fn extract_pdf_text_blocking(bytes: &[u8]) -> String {
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("PDF text extraction failed: {}", e);
            return String::new();
        }
    };

    let mut pages: Vec<u32> = doc.get_pages().keys().cloned().collect();
    pages.sort_unstable();

    let mut full_text = String::new();
    for page_num in pages {
        let page_text = doc.extract_text(&[page_num]).unwrap_or_default();
        if page_text.is_empty() {
            continue;
        }
        full_text.push_str(page_text.trim_end());
        full_text.push('\n');
    }
    full_text.trim().to_string()
}
