//! Page-document extraction: rebuild reading order from positioned glyph runs.
//!
//! A PDF page stores text as independently positioned fragments with no
//! inherent reading order. Each page is reconstructed in three passes:
//!
//! 1. **Group**: runs whose baseline Y rounds to the same integer form one
//!    line. Rounding absorbs the sub-point jitter font metrics introduce
//!    while keeping visually distinct lines apart.
//! 2. **Order**: lines top-to-bottom by descending Y (PDF user space grows
//!    upward), runs left-to-right by ascending X within a line.
//! 3. **Join**: runs with a single space, lines with `\n`, and a trailing
//!    `\n` closing every page that produced any text.
//!
//! Pages are processed strictly in ascending order, one at a time, with a
//! [`PipelineStep::ParsingPage`] emitted before each.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a synchronous C++ library with thread-affine state. All pdfium
//! work for one document (bind, load, every page) happens on a single
//! blocking-pool thread; progress callbacks are invoked from that thread.

use crate::config::IngestConfig;
use crate::document::GlyphRun;
use crate::error::IngestError;
use crate::progress::{emit, PipelineStep, ProgressCallback};
use pdfium_render::prelude::*;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A page-addressable document that yields positioned glyph runs.
///
/// Implemented over pdfium for real documents; tests supply in-memory pages.
pub trait PageSource {
    /// Total number of pages.
    fn page_count(&self) -> usize;

    /// The glyph runs of page `index` (0-based), in storage order.
    fn glyph_runs(&self, index: usize) -> Result<Vec<GlyphRun>, IngestError>;
}

impl PageSource for Vec<Vec<GlyphRun>> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn glyph_runs(&self, index: usize) -> Result<Vec<GlyphRun>, IngestError> {
        Ok(self.get(index).cloned().unwrap_or_default())
    }
}

/// The text recovered from a page document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub page_count: usize,
    pub pages_with_text: usize,
}

/// Reconstruct the text of one page from its glyph runs.
///
/// Returns an empty string for a page with no non-empty runs.
pub fn reconstruct_page(runs: Vec<GlyphRun>) -> String {
    // BTreeMap keyed by Reverse(y) iterates top line first.
    let mut lines: BTreeMap<Reverse<i64>, Vec<GlyphRun>> = BTreeMap::new();
    for run in runs.into_iter().filter(|r| !r.text.is_empty()) {
        let key = Reverse(run.y.round() as i64);
        lines.entry(key).or_default().push(run);
    }

    let mut out = String::new();
    for (_, mut line) in lines {
        // Stable: runs at identical X keep storage order.
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
        let joined = line
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&joined);
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Walk every page of `source` in order and concatenate the reconstructed
/// text.
pub fn extract_pages<S: PageSource + ?Sized>(
    source: &S,
    progress: Option<&ProgressCallback>,
) -> Result<PageText, IngestError> {
    let total = source.page_count();
    let mut text = String::new();
    let mut pages_with_text = 0;

    for idx in 0..total {
        emit(
            progress,
            PipelineStep::ParsingPage {
                current: idx + 1,
                total,
            },
        );
        let page = reconstruct_page(source.glyph_runs(idx)?);
        if page.is_empty() {
            debug!("Page {}/{} has no text", idx + 1, total);
            continue;
        }
        pages_with_text += 1;
        text.push_str(&page);
    }

    Ok(PageText {
        text,
        page_count: total,
        pages_with_text,
    })
}

// ── pdfium backend ───────────────────────────────────────────────────────────

/// Extract a PDF held in memory.
///
/// Runs inside `spawn_blocking`. The caller emits
/// [`PipelineStep::DecodingPages`] beforehand; this function emits one
/// [`PipelineStep::ParsingPage`] per page.
pub async fn extract_page_document(
    bytes: Vec<u8>,
    file_name: &str,
    config: &IngestConfig,
) -> Result<PageText, IngestError> {
    let name = file_name.to_string();
    let password = config.pdf_password.clone();
    let library_path = config.pdfium_library_path.clone();
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        extract_page_document_blocking(
            &bytes,
            &name,
            password.as_deref(),
            library_path,
            progress.as_ref(),
        )
    })
    .await
    .map_err(|e| IngestError::Internal(format!("Page extraction task panicked: {}", e)))?
}

fn extract_page_document_blocking(
    bytes: &[u8],
    file_name: &str,
    password: Option<&str>,
    library_path: Option<PathBuf>,
    progress: Option<&ProgressCallback>,
) -> Result<PageText, IngestError> {
    let pdfium = bind_pdfium(library_path)?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| map_load_error(e, file_name, password.is_some()))?;

    let source = PdfiumPages {
        document: &document,
        file_name,
    };
    info!("PDF loaded: '{}', {} pages", file_name, source.page_count());
    extract_pages(&source, progress)
}

/// Bind libpdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system
/// library search path.
fn bind_pdfium(library_path: Option<PathBuf>) -> Result<Pdfium, IngestError> {
    let explicit = library_path.or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));
    let bindings = match explicit {
        Some(path) => {
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path).map_err(|e| {
                IngestError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
            })?
        }
        None => Pdfium::bind_to_system_library()
            .map_err(|e| IngestError::PdfiumBindingFailed(e.to_string()))?,
    };
    Ok(Pdfium::new(bindings))
}

fn map_load_error(e: PdfiumError, file_name: &str, had_password: bool) -> IngestError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            IngestError::WrongPassword {
                file_name: file_name.to_string(),
            }
        } else {
            IngestError::PasswordRequired {
                file_name: file_name.to_string(),
            }
        }
    } else {
        IngestError::CorruptPageDocument {
            file_name: file_name.to_string(),
            detail,
        }
    }
}

/// A loaded pdfium document viewed as a [`PageSource`].
struct PdfiumPages<'a, 'doc> {
    document: &'a PdfDocument<'doc>,
    file_name: &'a str,
}

impl PageSource for PdfiumPages<'_, '_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn glyph_runs(&self, index: usize) -> Result<Vec<GlyphRun>, IngestError> {
        let corrupt = |detail: String| IngestError::CorruptPageDocument {
            file_name: self.file_name.to_string(),
            detail: format!("page {}: {}", index + 1, detail),
        };

        let page_index = PdfPageIndex::try_from(index).map_err(|e| corrupt(e.to_string()))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| corrupt(format!("{:?}", e)))?;
        let text = match page.text() {
            Ok(text) => text,
            Err(e) => {
                warn!("Page {} has no text layer: {:?}", index + 1, e);
                return Ok(Vec::new());
            }
        };

        let runs = text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                GlyphRun::new(segment.text(), bounds.left().value, bounds.bottom().value)
            })
            .collect();
        Ok(runs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn run(text: &str, x: f32, y: f32) -> GlyphRun {
        GlyphRun::new(text, x, y)
    }

    #[test]
    fn two_lines_descending_y_ascending_x() {
        // Storage order deliberately scrambled.
        let runs = vec![
            run("Engineer", 200.0, 80.0),
            run("Doe", 150.0, 100.0),
            run("Senior", 100.0, 80.0),
            run("Jane", 100.0, 100.0),
        ];
        assert_eq!(reconstruct_page(runs), "Jane Doe\nSenior Engineer\n");
    }

    #[test]
    fn sub_point_jitter_shares_a_line() {
        let runs = vec![run("b", 20.0, 99.6), run("a", 10.0, 100.4)];
        assert_eq!(reconstruct_page(runs), "a b\n");
    }

    #[test]
    fn distinct_rounded_y_are_separate_lines() {
        let runs = vec![run("low", 0.0, 99.4), run("high", 0.0, 100.6)];
        assert_eq!(reconstruct_page(runs), "high\nlow\n");
    }

    #[test]
    fn equal_x_keeps_storage_order() {
        let runs = vec![run("first", 5.0, 10.0), run("second", 5.0, 10.0)];
        assert_eq!(reconstruct_page(runs), "first second\n");
    }

    #[test]
    fn empty_page_contributes_nothing() {
        assert_eq!(reconstruct_page(Vec::new()), "");
        assert_eq!(reconstruct_page(vec![run("", 1.0, 1.0)]), "");
    }

    #[test]
    fn pages_concatenate_in_order() {
        let pages: Vec<Vec<GlyphRun>> = vec![
            vec![run("Page", 0.0, 700.0), run("one", 40.0, 700.0)],
            vec![],
            vec![run("Page", 0.0, 700.0), run("three", 40.0, 700.0)],
        ];
        let out = extract_pages(&pages, None).unwrap();
        assert_eq!(out.text, "Page one\nPage three\n");
        assert_eq!(out.page_count, 3);
        assert_eq!(out.pages_with_text, 2);
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<PipelineStep>>);

    impl crate::progress::ExtractionProgressCallback for Recorder {
        fn on_step(&self, step: &PipelineStep) {
            self.0.lock().unwrap().push(*step);
        }
    }

    #[test]
    fn emits_one_step_per_page_before_processing() {
        let recorder = Arc::new(Recorder::default());
        let cb: ProgressCallback = recorder.clone();
        let pages: Vec<Vec<GlyphRun>> = vec![vec![run("a", 0.0, 0.0)], vec![], vec![]];
        extract_pages(&pages, Some(&cb)).unwrap();
        let steps = recorder.0.lock().unwrap().clone();
        assert_eq!(
            steps,
            vec![
                PipelineStep::ParsingPage { current: 1, total: 3 },
                PipelineStep::ParsingPage { current: 2, total: 3 },
                PipelineStep::ParsingPage { current: 3, total: 3 },
            ]
        );
    }

    struct FailingPage;

    impl PageSource for FailingPage {
        fn page_count(&self) -> usize {
            2
        }

        fn glyph_runs(&self, index: usize) -> Result<Vec<GlyphRun>, IngestError> {
            if index == 1 {
                Err(IngestError::CorruptPageDocument {
                    file_name: "cv.pdf".into(),
                    detail: "page 2: bad xref".into(),
                })
            } else {
                Ok(vec![GlyphRun::new("ok", 0.0, 0.0)])
            }
        }
    }

    #[test]
    fn page_failure_aborts_run() {
        let err = extract_pages(&FailingPage, None).unwrap_err();
        assert!(matches!(err, IngestError::CorruptPageDocument { .. }));
    }
}
