//! Error types for the edgequake-doc2text library.
//!
//! Two layers reflect two different audiences:
//!
//! * [`IngestError`]: the **precise** failure, one variant per failure mode
//!   (missing file, corrupt DOCX, PDF password, rate-limited analysis …).
//!   Returned as `Err(IngestError)` from every fallible library function.
//!
//! * [`Failure`]: the **user-facing** record: an [`ErrorCategory`] plus one
//!   human-readable message. A `Failure` is produced exactly once, at the
//!   orchestrator/session boundary, and is stored in
//!   [`crate::state::AppState`]. Its category is frozen at that point and is
//!   never re-derived from a later failure of an unrelated stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-doc2text library.
#[derive(Debug, Error)]
pub enum IngestError {
    // ── Format errors ─────────────────────────────────────────────────────
    /// The declared media type / extension is not one of the supported formats.
    #[error(
        "Incompatible media: '{file_name}' ({}) is not a supported document format.\n\
Supported: plain text (.txt), Word (.docx), PDF (.pdf).",
        .media_type.as_deref().unwrap_or("no declared type")
    )]
    UnsupportedFormat {
        file_name: String,
        media_type: Option<String>,
    },

    // ── Acquisition errors ────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading the file failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document exceeds the configured size limit.
    #[error("Document '{file_name}' is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge {
        file_name: String,
        size: u64,
        limit: u64,
    },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// A plain-text document is not valid UTF-8.
    #[error("'{file_name}' is not valid UTF-8 text: {detail}")]
    InvalidUtf8 { file_name: String, detail: String },

    /// The DOCX container or its WordprocessingML could not be unpacked.
    #[error("Word document '{file_name}' could not be unpacked: {detail}")]
    CorruptFlowDocument { file_name: String, detail: String },

    /// PDF header/trailer/xref is corrupt, or a page could not be parsed.
    #[error("PDF '{file_name}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPageDocument { file_name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{file_name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { file_name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{file_name}'")]
    WrongPassword { file_name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Page documents are decoded with PDFium. You can:\n\
  • Install libpdfium where the system loader can find it.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use a specific copy.\n"
    )]
    PdfiumBindingFailed(String),

    /// The document decoded fine but nothing survived sanitisation
    /// (typically a scanned, image-only PDF).
    #[error("Data void: '{file_name}' contains no interpretable text.")]
    NoInterpretableText { file_name: String },

    // ── Submission errors ─────────────────────────────────────────────────
    /// A field required to start an analysis is empty.
    #[error("Requirement missing: {field} is required before analysis can start.")]
    MissingInput { field: &'static str },

    // ── Analysis errors ───────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The analysis backend returned HTTP 429.
    #[error("Rate limit reached for provider '{provider}'. Please wait a moment before trying again.")]
    RateLimited { provider: String },

    /// The analysis call did not finish in time.
    #[error("Analysis timed out after {secs}s")]
    AnalysisTimeout { secs: u64 },

    /// The analysis backend failed or produced no report.
    #[error("Analysis failed: {message}")]
    AnalysisFailed { message: String },

    /// The analysis backend answered, but not with a valid report.
    #[error("Analysis report could not be parsed: {detail}")]
    MalformedReport { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// Classify this error into the user-facing taxonomy.
    ///
    /// Every variant maps to exactly one category. Variants that do not
    /// belong to a known pipeline stage map to [`ErrorCategory::Unknown`]
    /// rather than being folded into `Extraction`.
    pub fn category(&self) -> ErrorCategory {
        match self {
            IngestError::UnsupportedFormat { .. } => ErrorCategory::FileType,

            IngestError::FileNotFound { .. }
            | IngestError::PermissionDenied { .. }
            | IngestError::ReadFailed { .. }
            | IngestError::FileTooLarge { .. }
            | IngestError::InvalidInput { .. }
            | IngestError::DownloadFailed { .. }
            | IngestError::DownloadTimeout { .. }
            | IngestError::InvalidUtf8 { .. }
            | IngestError::CorruptFlowDocument { .. }
            | IngestError::CorruptPageDocument { .. }
            | IngestError::PasswordRequired { .. }
            | IngestError::WrongPassword { .. }
            | IngestError::PdfiumBindingFailed(_)
            | IngestError::NoInterpretableText { .. } => ErrorCategory::Extraction,

            IngestError::MissingInput { .. } => ErrorCategory::Validation,

            IngestError::ProviderNotConfigured { .. }
            | IngestError::RateLimited { .. }
            | IngestError::AnalysisTimeout { .. }
            | IngestError::AnalysisFailed { .. }
            | IngestError::MalformedReport { .. } => ErrorCategory::Analysis,

            IngestError::InvalidConfig(_) | IngestError::Internal(_) => ErrorCategory::Unknown,
        }
    }
}

/// User-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The input is not a supported document type.
    FileType,
    /// The document could not be decoded, or decoded to no usable text.
    Extraction,
    /// The analysis collaborator failed (including rate limiting).
    Analysis,
    /// A required field was missing at submission time.
    Validation,
    /// Anything not attributable to a known stage.
    Unknown,
}

impl ErrorCategory {
    /// Fixed title shown above the error message.
    pub fn title(self) -> &'static str {
        match self {
            ErrorCategory::FileType => "MEDIA MISMATCH",
            ErrorCategory::Extraction => "DECODE ERROR",
            ErrorCategory::Analysis => "COMPUTE FAILURE",
            ErrorCategory::Validation => "INPUT DEFICIENCY",
            ErrorCategory::Unknown => "SYSTEM EXCEPTION",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A classified, user-facing failure: one category and one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub category: ErrorCategory,
    pub message: String,
}

impl Failure {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// Title derived from the category.
    pub fn title(&self) -> &'static str {
        self.category.title()
    }
}

impl From<&IngestError> for Failure {
    fn from(err: &IngestError) -> Self {
        Self::new(err.category(), err.to_string())
    }
}

impl From<IngestError> for Failure {
    fn from(err: IngestError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_is_file_type() {
        let e = IngestError::UnsupportedFormat {
            file_name: "photo.png".into(),
            media_type: Some("image/png".into()),
        };
        assert_eq!(e.category(), ErrorCategory::FileType);
        assert!(e.to_string().contains("photo.png"));
        assert!(e.to_string().contains("image/png"));
    }

    #[test]
    fn unsupported_format_without_type_display() {
        let e = IngestError::UnsupportedFormat {
            file_name: "notes.md".into(),
            media_type: None,
        };
        assert!(e.to_string().contains("no declared type"), "got: {e}");
    }

    #[test]
    fn extraction_failures_share_a_category() {
        let errors = [
            IngestError::NoInterpretableText {
                file_name: "scan.pdf".into(),
            },
            IngestError::InvalidUtf8 {
                file_name: "a.txt".into(),
                detail: "bad byte".into(),
            },
            IngestError::CorruptFlowDocument {
                file_name: "cv.docx".into(),
                detail: "missing word/document.xml".into(),
            },
            IngestError::PasswordRequired {
                file_name: "locked.pdf".into(),
            },
        ];
        for e in &errors {
            assert_eq!(e.category(), ErrorCategory::Extraction, "{e}");
        }
    }

    #[test]
    fn internal_errors_are_unknown_not_extraction() {
        let e = IngestError::Internal("task panicked".into());
        assert_eq!(e.category(), ErrorCategory::Unknown);
        assert_eq!(Failure::from(&e).title(), "SYSTEM EXCEPTION");
    }

    #[test]
    fn rate_limit_is_analysis() {
        let e = IngestError::RateLimited {
            provider: "gemini".into(),
        };
        assert_eq!(e.category(), ErrorCategory::Analysis);
        assert!(e.to_string().contains("gemini"));
    }

    #[test]
    fn missing_input_is_validation() {
        let failure = Failure::from(IngestError::MissingInput {
            field: "job description",
        });
        assert_eq!(failure.category, ErrorCategory::Validation);
        assert_eq!(failure.title(), "INPUT DEFICIENCY");
        assert!(failure.message.contains("job description"));
    }

    #[test]
    fn titles_are_fixed() {
        assert_eq!(ErrorCategory::FileType.title(), "MEDIA MISMATCH");
        assert_eq!(ErrorCategory::Extraction.title(), "DECODE ERROR");
        assert_eq!(ErrorCategory::Analysis.title(), "COMPUTE FAILURE");
        assert_eq!(ErrorCategory::Validation.title(), "INPUT DEFICIENCY");
        assert_eq!(ErrorCategory::Unknown.title(), "SYSTEM EXCEPTION");
    }
}
