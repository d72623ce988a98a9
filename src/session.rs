//! Async driver that connects [`AppState`] to real work.
//!
//! A [`Session`] owns the state, an event channel and the ticker timer. The
//! host feeds it user events with [`Session::dispatch`]; the session applies
//! them, carries out the resulting [`Command`]s by spawning tokio tasks, and
//! those tasks report back through the same channel. Every task is tagged
//! with the [`crate::state::RunId`] it was started for, so the reducer can
//! drop results that arrive after the user moved on.
//!
//! Tasks are never aborted: a superseded extraction keeps running to
//! completion and its result is discarded on arrival.

use crate::analysis::Analyzer;
use crate::config::IngestConfig;
use crate::error::Failure;
use crate::extract;
use crate::progress::{ExtractionProgressCallback, PipelineStep};
use crate::state::{AppState, Command, Event, RunId};
use crate::ticker::TickerHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Turns pipeline steps into reducer events for one run.
struct RunProgress {
    run: RunId,
    tx: mpsc::UnboundedSender<Event>,
}

impl ExtractionProgressCallback for RunProgress {
    fn on_step(&self, step: &PipelineStep) {
        let _ = self.tx.send(Event::ExtractionProgress {
            run: self.run,
            step: *step,
        });
    }
}

/// State plus the machinery that runs extraction and analysis for it.
pub struct Session<A: Analyzer> {
    state: AppState,
    config: IngestConfig,
    analyzer: Arc<A>,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    ticker: Option<TickerHandle>,
}

impl<A: Analyzer> Session<A> {
    pub fn new(config: IngestConfig, analyzer: A) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(&config),
            config,
            analyzer: Arc::new(analyzer),
            tx,
            rx,
            ticker: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// A sender for injecting events from other tasks (e.g. a UI thread).
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Whether the analysis ticker timer is currently running.
    pub fn ticker_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Apply `event` and carry out the commands it produces.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, event: Event) {
        for command in self.state.apply(event) {
            self.execute(command);
        }
    }

    /// Wait for the next event from a background task and dispatch it.
    pub async fn next_event(&mut self) -> &AppState {
        // The session holds a sender, so the channel never closes.
        if let Some(event) = self.rx.recv().await {
            self.dispatch(event);
        }
        &self.state
    }

    /// Dispatch background events until `done` holds.
    pub async fn run_until(&mut self, mut done: impl FnMut(&AppState) -> bool) -> &AppState {
        while !done(&self.state) {
            self.next_event().await;
        }
        &self.state
    }

    /// Dispatch every event already queued, without waiting.
    pub fn drain(&mut self) -> &AppState {
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
        }
        &self.state
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::StartExtraction { run, document } => {
                let config = self.config.with_progress_callback(Arc::new(RunProgress {
                    run,
                    tx: self.tx.clone(),
                }));
                let tx = self.tx.clone();
                info!("{}: starting extraction of '{}'", run, document.file_name);
                tokio::spawn(async move {
                    let result = extract::extract(document, &config)
                        .await
                        .map_err(Failure::from);
                    let _ = tx.send(Event::ExtractionFinished { run, result });
                });
            }
            Command::StartAnalysis {
                run,
                resume_text,
                job_description,
            } => {
                let analyzer = Arc::clone(&self.analyzer);
                let tx = self.tx.clone();
                info!("{}: starting analysis", run);
                tokio::spawn(async move {
                    let result = analyzer
                        .analyze(&resume_text, &job_description)
                        .await
                        .map_err(Failure::from);
                    let _ = tx.send(Event::AnalysisFinished { run, result });
                });
            }
            Command::StartTicker { run } => {
                // `interval_at` panics on a zero period.
                let interval = Duration::from_millis(self.config.ticker_interval_ms.max(1));
                self.ticker = Some(TickerHandle::spawn(interval, self.tx.clone(), move || {
                    Event::TickerAdvanced { run }
                }));
            }
            Command::StopTicker => {
                if self.ticker.take().is_some() {
                    debug!("Ticker stopped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{parse_report, AnalysisReport};
    use crate::document::RawDocument;
    use crate::error::{ErrorCategory, IngestError};
    use crate::state::{AnalysisPhase, ExtractionPhase};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sleeps for `delay`, then answers with the sample report or an error.
    struct FakeAnalyzer {
        delay: Duration,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeAnalyzer {
        fn new(delay_ms: u64, fail: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    delay: Duration::from_millis(delay_ms),
                    fail,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl Analyzer for FakeAnalyzer {
        async fn analyze(
            &self,
            _resume_text: &str,
            _job_description: &str,
        ) -> Result<AnalysisReport, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(IngestError::RateLimited {
                    provider: "fake".into(),
                })
            } else {
                parse_report(crate::analysis::tests::SAMPLE)
            }
        }
    }

    fn text_doc(name: &str, body: &str) -> RawDocument {
        RawDocument::from_bytes(name, Some("text/plain"), body)
    }

    #[tokio::test]
    async fn extraction_populates_state() {
        let (analyzer, _) = FakeAnalyzer::new(0, false);
        let mut session = Session::new(IngestConfig::default(), analyzer);
        session.dispatch(Event::FileSelected(text_doc("cv.txt", "  Jane   Doe ")));
        let state = session.run_until(|s| !s.is_extracting()).await;
        assert_eq!(state.working_text, "Jane Doe");
        assert_eq!(state.extraction, ExtractionPhase::Succeeded);
    }

    #[tokio::test]
    async fn unsupported_file_fails_and_clears_name() {
        let (analyzer, _) = FakeAnalyzer::new(0, false);
        let mut session = Session::new(IngestConfig::default(), analyzer);
        session.dispatch(Event::FileSelected(RawDocument::from_bytes(
            "photo.png",
            Some("image/png"),
            vec![0u8; 4],
        )));
        let state = session.run_until(|s| !s.is_extracting()).await;
        assert_eq!(state.extraction, ExtractionPhase::Failed(ErrorCategory::FileType));
        assert_eq!(state.file_name, None);
        assert_eq!(state.error.as_ref().map(|f| f.title()), Some("MEDIA MISMATCH"));
    }

    #[tokio::test]
    async fn newest_selection_wins() {
        let (analyzer, _) = FakeAnalyzer::new(0, false);
        let mut session = Session::new(IngestConfig::default(), analyzer);
        session.dispatch(Event::FileSelected(text_doc("old.txt", "old")));
        session.dispatch(Event::FileSelected(text_doc("new.txt", "new")));
        session.run_until(|s| !s.is_extracting()).await;
        // Give the superseded run time to land, then process it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = session.drain();
        assert_eq!(state.working_text, "new");
        assert_eq!(state.file_name.as_deref(), Some("new.txt"));
    }

    #[tokio::test]
    async fn empty_job_description_never_calls_analyzer() {
        let (analyzer, calls) = FakeAnalyzer::new(0, false);
        let mut session = Session::new(IngestConfig::default(), analyzer);
        session.dispatch(Event::ResumeTextEdited("Rust engineer".into()));
        session.dispatch(Event::AnalysisRequested);
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            session.state().error.as_ref().map(|f| f.category),
            Some(ErrorCategory::Validation)
        );
        assert!(!session.ticker_running());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_advances_while_analysis_runs_and_stops_after() {
        let (analyzer, calls) = FakeAnalyzer::new(7_000, false);
        let mut session = Session::new(IngestConfig::default(), analyzer);
        session.dispatch(Event::ResumeTextEdited("Rust engineer".into()));
        session.dispatch(Event::JobDescriptionEdited("Senior Rust role".into()));
        session.dispatch(Event::AnalysisRequested);
        assert!(session.ticker_running());

        let state = session.run_until(|s| !s.is_analyzing()).await;
        assert!(matches!(state.analysis, AnalysisPhase::Complete(_)));
        // Ticks at 3 s and 6 s landed before the 7 s completion.
        assert_eq!(state.ticker.index(), 2);
        assert!(!session.ticker_running());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn analysis_failure_stops_ticker() {
        let (analyzer, _) = FakeAnalyzer::new(1_000, true);
        let mut session = Session::new(IngestConfig::default(), analyzer);
        session.dispatch(Event::ResumeTextEdited("a".into()));
        session.dispatch(Event::JobDescriptionEdited("b".into()));
        session.dispatch(Event::AnalysisRequested);

        let state = session.run_until(|s| !s.is_analyzing()).await;
        assert_eq!(state.error.as_ref().map(|f| f.category), Some(ErrorCategory::Analysis));
        assert!(!session.ticker_running());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ticker_interval_still_ticks() {
        let (analyzer, _) = FakeAnalyzer::new(5, false);
        let config = IngestConfig {
            ticker_interval_ms: 0,
            ..IngestConfig::default()
        };
        let mut session = Session::new(config, analyzer);
        session.dispatch(Event::ResumeTextEdited("a".into()));
        session.dispatch(Event::JobDescriptionEdited("b".into()));
        session.dispatch(Event::AnalysisRequested);

        let state = session.run_until(|s| !s.is_analyzing()).await;
        assert!(matches!(state.analysis, AnalysisPhase::Complete(_)));
        assert!(state.ticker.index() > 0);
    }
}
