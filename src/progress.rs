//! Pipeline steps and the progress-callback trait.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::IngestConfigBuilder::progress_callback`] to receive each
//! [`PipelineStep`] as the orchestrator reaches it.
//!
//! Steps are emitted strictly forward: within one run no step is emitted
//! after a step with a higher [`PipelineStep::ordinal`], and `ParsingPage`
//! events arrive with `current` increasing by one from `1` to `total`.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2text::{ExtractionProgressCallback, IngestConfig, PipelineStep};
//! use std::sync::Arc;
//!
//! struct PrintSteps;
//!
//! impl ExtractionProgressCallback for PrintSteps {
//!     fn on_step(&self, step: &PipelineStep) {
//!         eprintln!("{step}");
//!     }
//! }
//!
//! let config = IngestConfig::builder()
//!     .progress_callback(Arc::new(PrintSteps))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A discrete stage of one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Reading the upload.
    Acquiring,
    /// Opening the page structure of a page document.
    DecodingPages,
    /// Reconstructing the text of page `current` (1-indexed) of `total`.
    ParsingPage { current: usize, total: usize },
    /// Unpacking a flow document.
    UnpackingFlow,
    /// Running the sanitizer.
    Sanitizing,
    /// Terminal success.
    Success,
}

impl PipelineStep {
    /// Position in the forward order of steps.
    ///
    /// `DecodingPages`/`ParsingPage` and `UnpackingFlow` are alternatives
    /// (one per format) and share the extraction band.
    pub fn ordinal(&self) -> u8 {
        match self {
            PipelineStep::Acquiring => 0,
            PipelineStep::DecodingPages => 1,
            PipelineStep::ParsingPage { .. } | PipelineStep::UnpackingFlow => 2,
            PipelineStep::Sanitizing => 3,
            PipelineStep::Success => 4,
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Acquiring => f.write_str("Acquiring file stream..."),
            PipelineStep::DecodingPages => f.write_str("Decoding PDF structure..."),
            PipelineStep::ParsingPage { current, total } => {
                write!(f, "Parsing page {current} of {total}...")
            }
            PipelineStep::UnpackingFlow => f.write_str("Unpacking XML schemas..."),
            PipelineStep::Sanitizing => f.write_str("Sanitizing textual content..."),
            PipelineStep::Success => f.write_str("Stream read successful!"),
        }
    }
}

/// Receives pipeline steps as an extraction run advances.
///
/// Page steps are emitted from the blocking thread that decodes the page
/// document, so implementations must be `Send + Sync`.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once per step, in forward order.
    fn on_step(&self, step: &PipelineStep);
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {
    fn on_step(&self, _step: &PipelineStep) {}
}

/// Convenience alias matching the type stored in [`crate::config::IngestConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// Emit `step` to an optional callback.
pub(crate) fn emit(callback: Option<&ProgressCallback>, step: PipelineStep) {
    if let Some(cb) = callback {
        cb.on_step(&step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<PipelineStep>>);

    impl ExtractionProgressCallback for Recorder {
        fn on_step(&self, step: &PipelineStep) {
            self.0.lock().unwrap().push(*step);
        }
    }

    #[test]
    fn labels() {
        assert_eq!(
            PipelineStep::ParsingPage { current: 2, total: 7 }.to_string(),
            "Parsing page 2 of 7..."
        );
        assert_eq!(PipelineStep::Acquiring.to_string(), "Acquiring file stream...");
        assert_eq!(PipelineStep::Success.to_string(), "Stream read successful!");
    }

    #[test]
    fn ordinals_increase_along_a_page_run() {
        let run = [
            PipelineStep::Acquiring,
            PipelineStep::DecodingPages,
            PipelineStep::ParsingPage { current: 1, total: 1 },
            PipelineStep::Sanitizing,
            PipelineStep::Success,
        ];
        assert!(run.windows(2).all(|w| w[0].ordinal() <= w[1].ordinal()));
    }

    #[test]
    fn emit_reaches_callback() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let cb: ProgressCallback = rec.clone();
        emit(Some(&cb), PipelineStep::Sanitizing);
        emit(None, PipelineStep::Success);
        assert_eq!(*rec.0.lock().unwrap(), vec![PipelineStep::Sanitizing]);
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_step(&PipelineStep::Acquiring);
    }
}
