//! Application state and the reducer that drives it.
//!
//! [`AppState`] is the single record a front end renders from. It changes
//! only through [`AppState::apply`], which takes one [`Event`] and returns
//! the [`Command`]s the host must carry out (start an extraction, call the
//! analyzer, start or stop the ticker). The reducer itself never performs
//! I/O, which keeps every transition testable as a plain function call.
//!
//! ## Run identity
//!
//! Every extraction and analysis request is stamped with a fresh
//! [`RunId`]. Completions and progress events carry the id of the run that
//! produced them and are dropped unless it is still the current run. A
//! slow run that finishes after a newer one therefore cannot overwrite the
//! newer result, and anything in flight during a [`Event::Reset`] is
//! discarded when it lands.

use crate::analysis::AnalysisReport;
use crate::config::IngestConfig;
use crate::document::RawDocument;
use crate::error::{ErrorCategory, Failure};
use crate::output::ExtractionOutput;
use crate::pipeline::refine::{refine, RefinementOptions};
use crate::progress::PipelineStep;
use crate::ticker::TickerState;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const MSG_MISSING_INPUTS: &str =
    "Requirement Missing: Resume and target definition are both mandatory for analysis.";

/// Identity of one extraction or analysis run. Strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Where the extraction state machine currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionPhase {
    Idle,
    /// `step` is `None` until the first progress event arrives.
    Running {
        run: RunId,
        step: Option<PipelineStep>,
    },
    Succeeded,
    Failed(ErrorCategory),
}

/// Where the analysis request currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPhase {
    Idle,
    InFlight { run: RunId },
    Complete(Box<AnalysisReport>),
}

/// Inputs to the reducer.
#[derive(Debug)]
pub enum Event {
    /// The user picked a document. Starts a new extraction run.
    FileSelected(RawDocument),
    ExtractionProgress {
        run: RunId,
        step: PipelineStep,
    },
    ExtractionFinished {
        run: RunId,
        result: Result<ExtractionOutput, Failure>,
    },
    SetRefinementOptions(RefinementOptions),
    /// Apply the current refinement options to the working text once.
    RefineRequested,
    ToggleRefineTools,
    ResumeTextEdited(String),
    JobDescriptionEdited(String),
    AnalysisRequested,
    /// One analysis ticker interval elapsed for `run`.
    TickerAdvanced { run: RunId },
    AnalysisFinished {
        run: RunId,
        result: Result<AnalysisReport, Failure>,
    },
    ToggleRawPreview,
    Reset,
}

/// Side effects the host must perform after an [`AppState::apply`].
#[derive(Debug)]
pub enum Command {
    StartExtraction {
        run: RunId,
        document: RawDocument,
    },
    StartAnalysis {
        run: RunId,
        resume_text: String,
        job_description: String,
    },
    StartTicker { run: RunId },
    StopTicker,
}

/// Everything a front end needs to render.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Editable text: sanitised extraction output, then refined or edited.
    pub working_text: String,
    /// What the last successful extraction produced; never edited.
    pub source_text: String,
    pub job_description: String,
    /// Name of the loaded document. Cleared when an extraction fails.
    pub file_name: Option<String>,
    pub extraction: ExtractionPhase,
    pub analysis: AnalysisPhase,
    pub refine_options: RefinementOptions,
    pub show_refine_tools: bool,
    pub show_raw_preview: bool,
    pub ticker: TickerState,
    /// The live failure, if any. At most one at a time.
    pub error: Option<Failure>,
    last_run: u64,
    extraction_run: Option<RunId>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&IngestConfig::default())
    }
}

impl AppState {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            working_text: String::new(),
            source_text: String::new(),
            job_description: String::new(),
            file_name: None,
            extraction: ExtractionPhase::Idle,
            analysis: AnalysisPhase::Idle,
            refine_options: config.refinement,
            show_refine_tools: false,
            show_raw_preview: false,
            ticker: TickerState::new(config.analysis_phases.iter().cloned()),
            error: None,
            last_run: 0,
            extraction_run: None,
        }
    }

    /// The current analysis report, if the last analysis succeeded.
    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.analysis {
            AnalysisPhase::Complete(report) => Some(&**report),
            _ => None,
        }
    }

    pub fn is_extracting(&self) -> bool {
        matches!(self.extraction, ExtractionPhase::Running { .. })
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.analysis, AnalysisPhase::InFlight { .. })
    }

    /// Label for the current extraction step, or `""` when idle.
    pub fn extraction_label(&self) -> String {
        match self.extraction {
            ExtractionPhase::Running { step: Some(step), .. } => step.to_string(),
            _ => String::new(),
        }
    }

    fn next_run(&mut self) -> RunId {
        self.last_run += 1;
        RunId(self.last_run)
    }

    fn fail(&mut self, failure: Failure) {
        debug!("Failure [{}]: {}", failure.category, failure.message);
        self.error = Some(failure);
    }

    /// Apply one event and return the commands it triggers.
    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::FileSelected(document) => {
                let run = self.next_run();
                self.extraction_run = Some(run);
                self.extraction = ExtractionPhase::Running { run, step: None };
                self.file_name = Some(document.file_name.clone());
                self.error = None;
                debug!("{}: extracting '{}'", run, document.file_name);
                vec![Command::StartExtraction { run, document }]
            }

            Event::ExtractionProgress { run, step } => {
                match &mut self.extraction {
                    ExtractionPhase::Running { run: current, step: slot } if *current == run => {
                        *slot = Some(step);
                    }
                    _ => debug!("{}: dropping stale progress ({})", run, step),
                }
                Vec::new()
            }

            Event::ExtractionFinished { run, result } => {
                if self.extraction_run != Some(run) || !self.is_extracting() {
                    debug!("{}: dropping stale extraction result", run);
                    return Vec::new();
                }
                self.extraction_run = None;
                match result {
                    Ok(output) => {
                        self.working_text = output.text.clone();
                        self.source_text = output.text;
                        self.file_name = Some(output.file_name);
                        self.extraction = ExtractionPhase::Succeeded;
                        self.show_refine_tools = true;
                    }
                    Err(failure) => {
                        self.extraction = ExtractionPhase::Failed(failure.category);
                        self.file_name = None;
                        self.fail(failure);
                    }
                }
                Vec::new()
            }

            Event::SetRefinementOptions(options) => {
                self.refine_options = options;
                Vec::new()
            }

            Event::RefineRequested => {
                self.working_text = refine(&self.working_text, &self.refine_options);
                self.show_refine_tools = false;
                Vec::new()
            }

            Event::ToggleRefineTools => {
                self.show_refine_tools = !self.show_refine_tools && !self.working_text.is_empty();
                Vec::new()
            }

            Event::ResumeTextEdited(text) => {
                self.working_text = text;
                Vec::new()
            }

            Event::JobDescriptionEdited(text) => {
                self.job_description = text;
                Vec::new()
            }

            Event::AnalysisRequested => {
                if self.is_analyzing() {
                    debug!("Analysis already in flight; request ignored");
                    return Vec::new();
                }
                if self.working_text.trim().is_empty() || self.job_description.trim().is_empty() {
                    self.fail(Failure::new(ErrorCategory::Validation, MSG_MISSING_INPUTS));
                    return Vec::new();
                }
                let run = self.next_run();
                self.analysis = AnalysisPhase::InFlight { run };
                self.ticker.reset();
                self.error = None;
                debug!("{}: analysis requested", run);
                vec![
                    Command::StartTicker { run },
                    Command::StartAnalysis {
                        run,
                        resume_text: self.working_text.clone(),
                        job_description: self.job_description.clone(),
                    },
                ]
            }

            Event::TickerAdvanced { run } => {
                if self.analysis == (AnalysisPhase::InFlight { run }) {
                    self.ticker.advance();
                } else {
                    debug!("{}: dropping stale ticker tick", run);
                }
                Vec::new()
            }

            Event::AnalysisFinished { run, result } => {
                if self.analysis != (AnalysisPhase::InFlight { run }) {
                    debug!("{}: dropping stale analysis result", run);
                    return Vec::new();
                }
                match result {
                    Ok(report) => self.analysis = AnalysisPhase::Complete(Box::new(report)),
                    Err(failure) => {
                        self.analysis = AnalysisPhase::Idle;
                        self.fail(failure);
                    }
                }
                vec![Command::StopTicker]
            }

            Event::ToggleRawPreview => {
                self.show_raw_preview = !self.show_raw_preview && !self.source_text.is_empty();
                Vec::new()
            }

            Event::Reset => {
                let was_analyzing = self.is_analyzing();
                self.working_text.clear();
                self.source_text.clear();
                self.job_description.clear();
                self.file_name = None;
                self.extraction = ExtractionPhase::Idle;
                self.extraction_run = None;
                self.analysis = AnalysisPhase::Idle;
                self.show_refine_tools = false;
                self.show_raw_preview = false;
                self.ticker.reset();
                self.error = None;
                if was_analyzing {
                    vec![Command::StopTicker]
                } else {
                    Vec::new()
                }
            }
        }
    }
}
