//! Streaming extraction API: pipeline steps and the final outcome as one
//! `Stream`.
//!
//! [`crate::extract::extract`] reports steps through a callback and returns
//! the outcome separately. [`extract_stream`] merges both into a single
//! ordered stream of [`ExtractionEvent`]s, which is easier to forward to a
//! UI loop, a websocket or a progress bar. The stream always ends with
//! exactly one `Finished` item.

use crate::config::IngestConfig;
use crate::document::RawDocument;
use crate::error::IngestError;
use crate::extract;
use crate::output::ExtractionOutput;
use crate::progress::{ExtractionProgressCallback, PipelineStep, ProgressCallback};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

/// One item of an extraction stream.
#[derive(Debug)]
pub enum ExtractionEvent {
    /// The run reached a new step.
    Step(PipelineStep),
    /// The run ended. Always the last item.
    Finished(Result<ExtractionOutput, IngestError>),
}

/// A boxed stream of extraction events.
pub type ExtractionStream = Pin<Box<dyn Stream<Item = ExtractionEvent> + Send>>;

/// Forwards steps into the stream's channel, then to the caller's own
/// callback if one was configured.
struct ChannelProgress {
    tx: mpsc::UnboundedSender<ExtractionEvent>,
    inner: Option<ProgressCallback>,
}

impl ExtractionProgressCallback for ChannelProgress {
    fn on_step(&self, step: &PipelineStep) {
        let _ = self.tx.send(ExtractionEvent::Step(*step));
        if let Some(ref inner) = self.inner {
            inner.on_step(step);
        }
    }
}

/// Extract `document` on a background task, streaming its progress.
///
/// Must be called from within a tokio runtime. Dropping the stream does
/// not cancel the run; its remaining events are discarded.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2text::{extract_stream, ExtractionEvent, IngestConfig, RawDocument};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let doc = RawDocument::from_path("resume.pdf");
/// let mut events = extract_stream(doc, &IngestConfig::default());
/// while let Some(event) = events.next().await {
///     match event {
///         ExtractionEvent::Step(step) => eprintln!("{step}"),
///         ExtractionEvent::Finished(Ok(out)) => println!("{}", out.text),
///         ExtractionEvent::Finished(Err(e)) => eprintln!("{e}"),
///     }
/// }
/// # }
/// ```
pub fn extract_stream(document: RawDocument, config: &IngestConfig) -> ExtractionStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let forward = Arc::new(ChannelProgress {
        tx: tx.clone(),
        inner: config.progress_callback.clone(),
    });
    let config = config.with_progress_callback(forward);

    tokio::spawn(async move {
        let result = extract::extract(document, &config).await;
        if tx.send(ExtractionEvent::Finished(result)).is_err() {
            debug!("Extraction stream dropped before the run finished");
        }
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}
