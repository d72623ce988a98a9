//! Pipeline stages for document-to-text ingestion.
//!
//! Each submodule implements exactly one transformation step and is pure
//! apart from `input` (network / file-system) and the pdfium backend in
//! `page`.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ plain | flow | page ──▶ sanitize ──▶ (on demand) refine
//! (path/URL)  (.txt  .docx  .pdf)   (always)      (user options)
//! ```
//!
//! 1. [`input`]: resolve a path or URL to a [`crate::RawDocument`]
//! 2. [`plain`]: UTF-8 decode
//! 3. [`flow`]: DOCX paragraphs in stored order
//! 4. [`page`]: PDF reading-order reconstruction from glyph runs;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 5. [`sanitize`]: mandatory hygiene: control chars, line endings, spaces
//! 6. [`refine`]: optional cleanup the user applies to the working text

pub mod flow;
pub mod input;
pub mod page;
pub mod plain;
pub mod refine;
pub mod sanitize;
