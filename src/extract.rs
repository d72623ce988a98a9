//! Extraction orchestrator: detect → acquire → extract → sanitize.
//!
//! One call is one pipeline run. Steps are reported to the configured
//! [`crate::progress::ExtractionProgressCallback`] strictly forward:
//!
//! ```text
//! Acquiring ─▶ (DecodingPages ─▶ ParsingPage 1..N | UnpackingFlow | none) ─▶ Sanitizing ─▶ Success
//! ```
//!
//! A run either ends in `Success` or returns an error without emitting
//! any further step. There is no cancellation and no retry; a caller that
//! loses interest in a run simply ignores its result (see
//! [`crate::state`] for the run-identity guard).

use crate::config::IngestConfig;
use crate::document::RawDocument;
use crate::error::IngestError;
use crate::format::{self, DocumentFormat};
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::page::{self, PageSource};
use crate::pipeline::{flow, input, plain, sanitize};
use crate::progress::{emit, PipelineStep};
use std::time::Instant;
use tracing::{debug, info};

/// Extract and sanitise the text of `document`.
///
/// The format is decided before any byte is read, so an unsupported
/// document is rejected without touching its contents.
///
/// # Errors
/// - [`IngestError::UnsupportedFormat`] for anything but text, DOCX or PDF
/// - acquisition errors (not found, too large, download failure)
/// - decode errors from the format's extractor
/// - [`IngestError::NoInterpretableText`] when nothing survives sanitisation
pub async fn extract(
    document: RawDocument,
    config: &IngestConfig,
) -> Result<ExtractionOutput, IngestError> {
    let total_start = Instant::now();
    let progress = config.progress_callback.as_ref();
    info!("Starting extraction: {}", document.file_name);

    // ── Step 1: Acquire ──────────────────────────────────────────────────
    emit(progress, PipelineStep::Acquiring);
    let format = format::detect(document.media_type.as_deref(), &document.file_name)?;
    let file_name = document.file_name.clone();
    let bytes = document.read_bytes(config.max_file_bytes).await?;
    let input_bytes = bytes.len() as u64;

    // ── Step 2: Dispatch on format ───────────────────────────────────────
    let extract_start = Instant::now();
    let (raw, page_count, pages_with_text) = match format {
        DocumentFormat::PlainText => (plain::extract_plain(bytes, &file_name)?, None, 0),
        DocumentFormat::FlowDocument => {
            emit(progress, PipelineStep::UnpackingFlow);
            (flow::extract_flow(&bytes, &file_name)?, None, 0)
        }
        DocumentFormat::PageDocument => {
            emit(progress, PipelineStep::DecodingPages);
            let pages = page::extract_page_document(bytes, &file_name, config).await?;
            (pages.text, Some(pages.page_count), pages.pages_with_text)
        }
    };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    debug!(
        "Extracted {} raw chars from '{}' in {}ms",
        raw.len(),
        file_name,
        extract_duration_ms
    );

    // ── Step 3: Sanitise ─────────────────────────────────────────────────
    finish(
        raw,
        Draft {
            file_name,
            format,
            page_count,
            stats: ExtractionStats {
                input_bytes,
                pages_with_text,
                extract_duration_ms,
                ..Default::default()
            },
        },
        config,
        total_start,
    )
}

/// Run the page-document path of the pipeline over an arbitrary
/// [`PageSource`].
///
/// Emits the same steps as [`extract`] does for a PDF, minus the byte
/// acquisition. Useful when glyph runs come from a decoder other than
/// pdfium.
pub fn extract_from_pages<S: PageSource + ?Sized>(
    source: &S,
    file_name: impl Into<String>,
    config: &IngestConfig,
) -> Result<ExtractionOutput, IngestError> {
    let total_start = Instant::now();
    let progress = config.progress_callback.as_ref();
    let file_name = file_name.into();

    emit(progress, PipelineStep::Acquiring);
    emit(progress, PipelineStep::DecodingPages);
    let extract_start = Instant::now();
    let pages = page::extract_pages(source, progress)?;

    finish(
        pages.text,
        Draft {
            file_name,
            format: DocumentFormat::PageDocument,
            page_count: Some(pages.page_count),
            stats: ExtractionStats {
                pages_with_text: pages.pages_with_text,
                extract_duration_ms: extract_start.elapsed().as_millis() as u64,
                ..Default::default()
            },
        },
        config,
        total_start,
    )
}

/// Resolve a path or URL and extract it.
pub async fn extract_input(
    input_str: impl AsRef<str>,
    config: &IngestConfig,
) -> Result<ExtractionOutput, IngestError> {
    let document = input::resolve_input(input_str.as_ref(), config).await?;
    extract(document, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    document: RawDocument,
    config: &IngestConfig,
) -> Result<ExtractionOutput, IngestError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| IngestError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(document, config))
}

/// Everything about a run except its text.
struct Draft {
    file_name: String,
    format: DocumentFormat,
    page_count: Option<usize>,
    stats: ExtractionStats,
}

fn finish(
    raw: String,
    mut draft: Draft,
    config: &IngestConfig,
    total_start: Instant,
) -> Result<ExtractionOutput, IngestError> {
    let progress = config.progress_callback.as_ref();

    emit(progress, PipelineStep::Sanitizing);
    let text = sanitize::sanitize(&raw);
    if text.is_empty() {
        return Err(IngestError::NoInterpretableText {
            file_name: draft.file_name,
        });
    }

    draft.stats.raw_chars = raw.chars().count();
    draft.stats.sanitized_chars = text.chars().count();
    draft.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    emit(progress, PipelineStep::Success);

    info!(
        "Extraction complete: '{}' ({}), {} chars, {}ms total",
        draft.file_name, draft.format, draft.stats.sanitized_chars, draft.stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        text,
        file_name: draft.file_name,
        format: draft.format,
        page_count: draft.page_count,
        stats: draft.stats,
    })
}
