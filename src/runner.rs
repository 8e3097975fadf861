//! Background refresh runs, one at a time

use crate::error::IBondResult;
use crate::ledger::Ledger;
use crate::sink::RateMessageSink;
use crate::worker::{IBondWorker, RefreshOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

struct RunningRefresh {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<IBondResult<Option<RefreshOutcome>>>,
}

/// Runs refreshes on a blocking task. Starting a new refresh cancels the
/// running one and discards whatever it found.
#[derive(Default)]
pub struct RefreshRunner {
    current: Option<RunningRefresh>,
}

impl RefreshRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|run| !run.handle.is_finished())
    }

    /// Start a refresh of a ledger snapshot, after stopping any running one
    pub async fn start<S>(&mut self, worker: Arc<IBondWorker>, ledger: Arc<Ledger>, messages: S)
    where
        S: RateMessageSink + Send + 'static,
    {
        self.cancel().await;

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let handle = tokio::task::spawn_blocking(move || {
            let mut messages = messages;
            worker.run(&ledger, &flag, &mut messages)
        });
        log::info!("Started I bond refresh");

        self.current = Some(RunningRefresh { cancel, handle });
    }

    /// Stop the running refresh, if any, and wait for it to finish
    pub async fn cancel(&mut self) {
        if let Some(run) = self.current.take() {
            run.cancel.store(true, Ordering::Relaxed);
            match run.handle.await {
                Ok(Ok(Some(outcome))) => log::warn!(
                    "Discarded {} interest payments from a replaced refresh",
                    outcome.staged().len()
                ),
                Ok(Ok(None)) => log::warn!("Cancelled I bond refresh"),
                Ok(Err(e)) => log::warn!("Replaced refresh had failed: {}", e),
                Err(e) => log::warn!("Replaced refresh stopped abnormally: {}", e),
            }
        }
    }

    /// Wait for the running refresh. `None` when nothing ran or it was cancelled.
    pub async fn finish(&mut self) -> IBondResult<Option<RefreshOutcome>> {
        match self.current.take() {
            Some(run) => run.handle.await?,
            None => Ok(None),
        }
    }
}
