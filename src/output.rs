//! Output types returned by the extraction entry points.

use crate::format::DocumentFormat;
use serde::{Deserialize, Serialize};

/// The result of a successful extraction.
///
/// `text` is the sanitised plain text of the whole document. Page and
/// paragraph boundaries survive only as `\n`; no layout metadata is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub text: String,
    pub file_name: String,
    pub format: DocumentFormat,
    /// Number of pages decoded; `None` for formats without pages.
    pub page_count: Option<usize>,
    pub stats: ExtractionStats,
}

/// Size and timing figures for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Bytes read from the source.
    pub input_bytes: u64,
    /// Characters produced by the extractor, before sanitisation.
    pub raw_chars: usize,
    /// Characters left after sanitisation.
    pub sanitized_chars: usize,
    /// Pages that contributed at least one glyph run.
    pub pages_with_text: usize,
    pub extract_duration_ms: u64,
    pub total_duration_ms: u64,
}
