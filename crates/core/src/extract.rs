//! Text extraction collaborators. The pipeline only ever needs raw text;
//! how it is recovered (PDF text layer, OCR, plain read) is a host concern
//! specified at this boundary.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document type: {0}")]
    Unsupported(String),
    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not read PDF text layer: {0}")]
    Pdf(String),
}

/// Document categories the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Image,
    Other,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            Some("txt" | "md" | "text" | "log" | "csv") => Self::PlainText,
            Some("png" | "jpg" | "jpeg" | "heic" | "tif" | "tiff" | "gif") => Self::Image,
            _ => Self::Other,
        }
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Empty string (not an error) when a document has no recoverable text.
    async fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, ExtractError>;
}

/// Reads the text layer directly from local files. OCR is a host concern;
/// images therefore resolve to an empty string here.
#[derive(Debug, Default)]
pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, ExtractError> {
        match kind {
            DocumentKind::PlainText => Ok(fs::read_to_string(path).await?),
            DocumentKind::Pdf => pdf_text(path),
            DocumentKind::Image => Ok(String::new()),
            DocumentKind::Other => {
                let bytes = fs::read(path).await?;
                String::from_utf8(bytes)
                    .map_err(|_| ExtractError::Unsupported(path.display().to_string()))
            }
        }
    }
}

#[cfg(feature = "pdf")]
fn pdf_text(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(not(feature = "pdf"))]
fn pdf_text(_path: &Path) -> Result<String, ExtractError> {
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/b.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("x.txt")), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_path(Path::new("x.jpeg")), DocumentKind::Image);
        assert_eq!(DocumentKind::from_path(Path::new("x.bin")), DocumentKind::Other);
        assert_eq!(DocumentKind::from_path(Path::new("noext")), DocumentKind::Other);
    }

    #[tokio::test]
    async fn image_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"\x89PNG").unwrap();
        let text = FileTextExtractor
            .extract(&path, DocumentKind::Image)
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn non_utf8_other_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let err = FileTextExtractor
            .extract(&path, DocumentKind::Other)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }
}
