//! The uploaded document and its classification.
//!
//! An [`UploadedDocument`] is an ephemeral, request-owned byte buffer: it
//! is created at request ingress, consumed by exactly one pipeline run,
//! and dropped when that run returns. Nothing here is persisted.

/// An uploaded document held entirely in memory.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Raw file bytes as received.
    pub bytes: Vec<u8>,
    /// Declared media type (e.g. `application/pdf`, `image/png`).
    pub media_type: String,
    /// Original filename, used as a classification fallback when the
    /// declared media type is missing or generic.
    pub filename: String,
}

impl UploadedDocument {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    /// Byte length of the upload.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Classify the document from its declared media type and filename.
    pub fn kind(&self) -> DocumentKind {
        let name = self.filename.to_lowercase();
        if self.media_type == "application/pdf" || name.ends_with(".pdf") {
            return DocumentKind::Pdf;
        }
        if self.media_type == "text/plain" || name.ends_with(".txt") {
            return DocumentKind::PlainText;
        }
        if let Some(mime) = normalize_image_mime(&self.media_type) {
            return DocumentKind::Image(mime);
        }
        DocumentKind::Other
    }
}

/// What the pipeline can do with a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    /// A raster image, with the media type normalised (`image/jpg` is a
    /// common browser alias for `image/jpeg`).
    Image(String),
    /// Anything else. Not rasterisable; text extraction yields "".
    Other,
}

/// Map a declared image media type to its canonical form, or `None` if
/// the type is not a supported image format.
fn normalize_image_mime(media_type: &str) -> Option<String> {
    match media_type {
        "image/jpg" => Some("image/jpeg".to_string()),
        "image/png" | "image/jpeg" | "image/webp" | "image/bmp" => Some(media_type.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(media_type: &str, filename: &str) -> UploadedDocument {
        UploadedDocument::new(vec![1, 2, 3], media_type, filename)
    }

    #[test]
    fn classifies_pdf_by_media_type() {
        assert_eq!(doc("application/pdf", "cv").kind(), DocumentKind::Pdf);
    }

    #[test]
    fn classifies_pdf_by_extension() {
        assert_eq!(
            doc("application/octet-stream", "Resume.PDF").kind(),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn classifies_plain_text() {
        assert_eq!(doc("text/plain", "cv").kind(), DocumentKind::PlainText);
        assert_eq!(
            doc("application/octet-stream", "cv.txt").kind(),
            DocumentKind::PlainText
        );
    }

    #[test]
    fn normalizes_jpg_alias() {
        assert_eq!(
            doc("image/jpg", "scan").kind(),
            DocumentKind::Image("image/jpeg".to_string())
        );
    }

    #[test]
    fn keeps_canonical_image_types() {
        assert_eq!(
            doc("image/webp", "scan").kind(),
            DocumentKind::Image("image/webp".to_string())
        );
    }

    #[test]
    fn unknown_type_is_other() {
        assert_eq!(doc("application/msword", "cv.doc").kind(), DocumentKind::Other);
    }
}
