//! # edgequake-doc2text
//!
//! Turn uploaded resumes (PDF, DOCX or plain text) into clean,
//! analysis-ready text, and drive the surrounding extract → refine →
//! analyse workflow.
//!
//! ## Why this crate?
//!
//! PDF pages store text as positioned fragments with no reading order;
//! naive extraction interleaves columns and scrambles lines. This crate
//! rebuilds lines from glyph baselines, orders them top-to-bottom and
//! left-to-right, and then runs a deterministic sanitiser so every format
//! ends up as the same kind of plain text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! RawDocument
//!  │
//!  ├─ 1. Detect    declared media type, extension fallback (no I/O)
//!  ├─ 2. Acquire   read bytes (size-limited)
//!  ├─ 3. Extract   .txt decode | .docx XML flow | .pdf reading-order rebuild
//!  ├─ 4. Sanitize  control chars, line endings, whitespace (always)
//!  └─ 5. Refine    optional user-selected cleanup (on demand)
//! ```
//!
//! Around the pipeline, [`state::AppState`] is a reducer with a run-identity
//! guard, and [`session::Session`] runs its commands on tokio together with
//! the decorative analysis [`ticker`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2text::{extract, IngestConfig, RawDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IngestConfig::default();
//!     let output = extract(RawDocument::from_path("resume.pdf"), &config).await?;
//!     println!("{}", output.text);
//!     eprintln!("{} pages, {} chars", output.page_count.unwrap_or(0), output.stats.sanitized_chars);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2text` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-doc2text = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDF support
//!
//! Page documents are decoded with pdfium. The library is located via
//! [`IngestConfig::pdfium_library_path`], then `PDFIUM_LIB_PATH`, then the
//! system library search path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod state;
pub mod stream;
pub mod ticker;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{AnalysisReport, Analyzer, LlmAnalyzer};
pub use config::{IngestConfig, IngestConfigBuilder};
pub use document::{DocumentSource, GlyphRun, RawDocument};
pub use error::{ErrorCategory, Failure, IngestError};
pub use extract::{extract, extract_from_pages, extract_input, extract_sync};
pub use format::{detect, DocumentFormat};
pub use output::{ExtractionOutput, ExtractionStats};
pub use pipeline::page::PageSource;
pub use pipeline::refine::{refine, RefinementOptions};
pub use pipeline::sanitize::sanitize;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, PipelineStep, ProgressCallback};
pub use session::Session;
pub use state::{AppState, Command, Event, RunId};
pub use stream::{extract_stream, ExtractionEvent};
pub use ticker::{TickerHandle, TickerState};
