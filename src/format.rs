//! Format detection: classify a document by declared media type, falling
//! back to its file extension.
//!
//! Detection is a fail-fast validation boundary, not a content sniff. It
//! runs before any byte of the document is read, so an unsupported upload
//! costs nothing to reject. The extension is consulted only when the host
//! did not declare a usable type (some environments never set one for
//! plain-text files).

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Media type of plain-text uploads.
pub const MIME_PLAIN_TEXT: &str = "text/plain";
/// Media type of Word (OOXML) uploads.
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Media type of PDF uploads.
pub const MIME_PDF: &str = "application/pdf";

/// Declared types that carry no information about the actual format.
const AMBIGUOUS_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// The closed set of supported document formats.
///
/// Extraction dispatches with an exhaustive `match` on this enum, so adding a
/// format is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// UTF-8 text (`text/plain`, `.txt`).
    PlainText,
    /// Text stored as one linear reading-order stream (`.docx`).
    FlowDocument,
    /// Text stored as positioned glyph runs per page (`.pdf`).
    PageDocument,
}

impl DocumentFormat {
    /// Canonical media type for this format.
    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => MIME_PLAIN_TEXT,
            DocumentFormat::FlowDocument => MIME_DOCX,
            DocumentFormat::PageDocument => MIME_PDF,
        }
    }

    fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            MIME_PLAIN_TEXT => Some(DocumentFormat::PlainText),
            MIME_DOCX => Some(DocumentFormat::FlowDocument),
            MIME_PDF => Some(DocumentFormat::PageDocument),
            _ => None,
        }
    }

    fn from_extension(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentFormat::PlainText),
            "docx" => Some(DocumentFormat::FlowDocument),
            "pdf" => Some(DocumentFormat::PageDocument),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::PlainText => "plain text",
            DocumentFormat::FlowDocument => "Word document",
            DocumentFormat::PageDocument => "PDF",
        };
        f.write_str(name)
    }
}

/// Classify a document.
///
/// # Arguments
/// * `media_type`: type declared by the host, if any
/// * `file_name`: used for the extension fallback and error messages
///
/// # Errors
/// [`IngestError::UnsupportedFormat`] when the declared type is not one of
/// the three supported types, or when no usable type was declared and the
/// extension is not `.txt`, `.docx` or `.pdf`.
pub fn detect(media_type: Option<&str>, file_name: &str) -> Result<DocumentFormat, IngestError> {
    let declared = media_type.map(normalise_media_type).filter(|t| !t.is_empty());

    let detected = match declared.as_deref() {
        Some(t) if !AMBIGUOUS_TYPES.contains(&t) => DocumentFormat::from_media_type(t),
        _ => DocumentFormat::from_extension(file_name),
    };

    match detected {
        Some(format) => {
            debug!(
                "Detected {} for '{}' (declared: {:?})",
                format, file_name, declared
            );
            Ok(format)
        }
        None => Err(IngestError::UnsupportedFormat {
            file_name: file_name.to_string(),
            media_type: declared,
        }),
    }
}

/// Lowercase and drop parameters: `"Text/Plain; charset=UTF-8"` → `"text/plain"`.
fn normalise_media_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
