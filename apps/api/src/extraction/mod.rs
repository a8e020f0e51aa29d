//! Plain-text extraction from stored résumé artifacts.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::storage::ResumeStore;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document could not be read: {0}")]
    Unreadable(String),

    #[error("document contains no extractable text")]
    Empty,

    #[error("failed to load document: {0}")]
    Storage(#[source] anyhow::Error),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, location: &str) -> Result<String, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    PlainText,
}

fn document_kind(location: &str) -> Result<DocumentKind, ExtractionError> {
    let ext = location
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.contains('/'))
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => Ok(DocumentKind::Pdf),
        "txt" | "md" | "text" => Ok(DocumentKind::PlainText),
        "" => Err(ExtractionError::UnsupportedFormat(
            "file has no extension".to_string(),
        )),
        other => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
    }
}

/// Whether [`DocumentTextExtractor`] can decode a file with this name.
pub fn is_supported_document(file_name: &str) -> bool {
    document_kind(file_name).is_ok()
}

/// Reads the artifact back from the [`ResumeStore`] and decodes it by extension:
/// PDF through `pdf-extract`, `.txt`/`.md` as UTF-8.
pub struct DocumentTextExtractor {
    store: Arc<dyn ResumeStore>,
}

impl DocumentTextExtractor {
    pub fn new(store: Arc<dyn ResumeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TextExtractor for DocumentTextExtractor {
    async fn extract(&self, location: &str) -> Result<String, ExtractionError> {
        let kind = document_kind(location)?;
        let bytes = self
            .store
            .get(location)
            .await
            .map_err(ExtractionError::Storage)?;

        let text = decode(kind, bytes).await?;
        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(ExtractionError::Empty);
        }
        debug!(location, chars = text.len(), "extracted résumé text");
        Ok(text)
    }
}

async fn decode(kind: DocumentKind, bytes: Bytes) -> Result<String, ExtractionError> {
    match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractionError::Unreadable(format!("not valid UTF-8: {e}"))),
        // pdf-extract is CPU bound and can panic on malformed input.
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes)
        })
        .await
        .map_err(|e| ExtractionError::Unreadable(format!("PDF parser aborted: {e}")))?
        .map_err(|e| ExtractionError::Unreadable(format!("invalid PDF: {e}"))),
    }
}

/// Collapses runs of blank lines and trailing spaces left by PDF layout.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalResumeStore;

    async fn stored(file_name: &str, body: &'static [u8]) -> (tempfile::TempDir, DocumentTextExtractor, String) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalResumeStore::new(dir.path()));
        let location = store
            .put(Bytes::from_static(body), "ada@example.com", file_name)
            .await
            .unwrap();
        (dir, DocumentTextExtractor::new(store), location)
    }

    #[tokio::test]
    async fn test_plain_text_is_returned_normalized() {
        let (_dir, extractor, location) =
            stored("cv.txt", b"Ada Lovelace   \n\n\n\n5 years of Go\n").await;
        let text = extractor.extract(&location).await.unwrap();
        assert_eq!(text, "Ada Lovelace\n\n5 years of Go");
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected_before_loading() {
        let (_dir, extractor, location) = stored("cv.docx", b"PK\x03\x04").await;
        let err = extractor.extract(&location).await.unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref f) if f == ".docx"));
    }

    #[tokio::test]
    async fn test_whitespace_only_document_is_empty() {
        let (_dir, extractor, location) = stored("cv.md", b"  \n\n \n").await;
        assert!(matches!(
            extractor.extract(&location).await.unwrap_err(),
            ExtractionError::Empty
        ));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_unreadable() {
        let (_dir, extractor, location) = stored("cv.pdf", b"definitely not a pdf").await;
        assert!(matches!(
            extractor.extract(&location).await.unwrap_err(),
            ExtractionError::Unreadable(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = DocumentTextExtractor::new(Arc::new(LocalResumeStore::new(dir.path())));
        assert!(matches!(
            extractor.extract("resumes/nobody/missing.txt").await.unwrap_err(),
            ExtractionError::Storage(_)
        ));
    }

    #[test]
    fn test_document_kind_requires_extension() {
        assert!(document_kind("resumes/a/cv").is_err());
        assert!(document_kind("resumes/a.b/cv").is_err());
        assert_eq!(document_kind("x/CV.PDF").unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn test_supported_documents() {
        assert!(is_supported_document("Ada Lovelace CV.pdf"));
        assert!(is_supported_document("notes.md"));
        assert!(!is_supported_document("cv.docx"));
        assert!(!is_supported_document("cv"));
    }
}
