//! Input-side data model: the uploaded document and the positioned glyph
//! runs a page decoder produces.

use crate::error::IngestError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the bytes of a [`RawDocument`] live.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// Already in memory (uploads, downloads, tests).
    Memory(Vec<u8>),
    /// On disk; read lazily, only once the format has been accepted.
    File(PathBuf),
}

/// An uploaded document: name, declared media type, and its bytes.
///
/// Consumed by value by [`crate::extract::extract`]; it is not retained
/// after extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub file_name: String,
    pub media_type: Option<String>,
    pub source: DocumentSource,
}

impl RawDocument {
    /// An in-memory document.
    pub fn from_bytes(
        file_name: impl Into<String>,
        media_type: Option<&str>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.map(str::to_string),
            source: DocumentSource::Memory(bytes.into()),
        }
    }

    /// A document on disk. No media type is declared; detection falls back
    /// to the extension unless [`RawDocument::with_media_type`] is used.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            file_name,
            media_type: None,
            source: DocumentSource::File(path.to_path_buf()),
        }
    }

    /// Override the declared media type.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Read the document's bytes, enforcing `limit`.
    pub(crate) async fn read_bytes(self, limit: u64) -> Result<Vec<u8>, IngestError> {
        let bytes = match self.source {
            DocumentSource::Memory(bytes) => bytes,
            DocumentSource::File(path) => {
                if let Ok(meta) = tokio::fs::metadata(&path).await {
                    if meta.len() > limit {
                        return Err(IngestError::FileTooLarge {
                            file_name: self.file_name,
                            size: meta.len(),
                            limit,
                        });
                    }
                }
                tokio::fs::read(&path).await.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => IngestError::FileNotFound { path: path.clone() },
                    std::io::ErrorKind::PermissionDenied => {
                        IngestError::PermissionDenied { path: path.clone() }
                    }
                    _ => IngestError::ReadFailed {
                        path: path.clone(),
                        source: e,
                    },
                })?
            }
        };

        let size = bytes.len() as u64;
        if size > limit {
            return Err(IngestError::FileTooLarge {
                file_name: self.file_name,
                size,
                limit,
            });
        }
        debug!("Acquired {} bytes for '{}'", size, self.file_name);
        Ok(bytes)
    }
}

/// A fragment of text sharing one position on a page.
///
/// Coordinates are in page space: `x` grows to the right, `y` grows upward
/// (so the top line of a page has the largest `y`).
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl GlyphRun {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_uses_file_name() {
        let doc = RawDocument::from_path("/tmp/some/dir/resume.pdf");
        assert_eq!(doc.file_name, "resume.pdf");
        assert!(doc.media_type.is_none());
        assert!(matches!(doc.source, DocumentSource::File(_)));
    }

    #[test]
    fn with_media_type_overrides() {
        let doc = RawDocument::from_path("resume").with_media_type("text/plain");
        assert_eq!(doc.media_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn read_bytes_enforces_limit() {
        let doc = RawDocument::from_bytes("big.txt", Some("text/plain"), vec![b'a'; 16]);
        let err = doc.read_bytes(8).await.unwrap_err();
        assert!(matches!(err, IngestError::FileTooLarge { size: 16, limit: 8, .. }));
    }

    #[tokio::test]
    async fn read_bytes_missing_file() {
        let doc = RawDocument::from_path("/definitely/not/here.txt");
        let err = doc.read_bytes(1024).await.unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound { .. }), "{err}");
    }

    #[tokio::test]
    async fn read_bytes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.txt");
        std::fs::write(&path, "hello").unwrap();
        let bytes = RawDocument::from_path(&path).read_bytes(1024).await.unwrap();
        assert_eq!(bytes, b"hello");
    }
}
