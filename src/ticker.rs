//! Decorative analysis progress: a phase label that advances on a timer.
//!
//! The ticker is deliberately unaware of the analysis call it decorates.
//! It starts at phase 0, moves one phase forward every interval and
//! parks on the last phase if the call runs long. Completion is signalled
//! only by the analysis result itself.
//!
//! The state ([`TickerState`]) is a plain value living in
//! [`crate::state::AppState`]; the timer ([`TickerHandle`]) is a tokio
//! task that only sends "advance" notifications and is aborted when the
//! handle is dropped.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

/// Current phase of the decorative ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerState {
    phases: Vec<String>,
    index: usize,
}

impl TickerState {
    /// A ticker over `phases`, positioned at the first one.
    pub fn new<I, S>(phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phases: phases.into_iter().map(Into::into).collect(),
            index: 0,
        }
    }

    /// Back to phase 0.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Move to the next phase, staying on the last one.
    pub fn advance(&mut self) {
        if self.index + 1 < self.phases.len() {
            self.index += 1;
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Label of the current phase, or `""` when there are no phases.
    pub fn label(&self) -> &str {
        self.phases.get(self.index).map(String::as_str).unwrap_or("")
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.phases.len()
    }
}

/// A running ticker timer. Dropping the handle stops it.
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Send `message()` on `tx` every `interval`, first after one full
    /// interval. The task ends by itself once the receiver is gone.
    pub fn spawn<T, F>(interval: Duration, tx: mpsc::UnboundedSender<T>, message: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                trace!("Ticker advanced");
                if tx.send(message()).is_err() {
                    break;
                }
            }
        });
        Self { task }
    }

    /// Stop the timer now.
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases() -> TickerState {
        TickerState::new(["one", "two", "three"])
    }

    #[test]
    fn advance_saturates_at_last_phase() {
        let mut t = phases();
        assert_eq!(t.label(), "one");
        for _ in 0..10 {
            t.advance();
        }
        assert_eq!(t.label(), "three");
        assert!(t.is_last());
        t.reset();
        assert_eq!(t.index(), 0);
    }

    #[test]
    fn empty_ticker_has_blank_label() {
        let mut t = TickerState::new(Vec::<String>::new());
        t.advance();
        assert_eq!(t.label(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = TickerHandle::spawn(Duration::from_millis(3_000), tx, || ());

        time::sleep(Duration::from_millis(2_999)).await;
        assert!(rx.try_recv().is_err());

        time::sleep(Duration::from_millis(2)).await;
        assert!(rx.try_recv().is_ok());

        time::sleep(Duration::from_millis(6_000)).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TickerHandle::spawn(Duration::from_millis(100), tx, || ());
        handle.stop();

        time::sleep(Duration::from_millis(1_000)).await;
        // Sender was owned by the aborted task, so the channel is closed
        // and empty.
        assert!(rx.recv().await.is_none());
    }
}
