//! Generation fan-out
//!
//! Sends N identical prompts to the collaborator concurrently and runs each
//! reply through a [`TrialExecutor`]. Waits for every trial; there is no early
//! exit once a majority is visible.

use crate::collaborator::{Collaborator, Prompt};
use crate::document::Document;
use crate::error::TrialError;
use crate::models::TrialOutcome;
use crate::trial::TrialExecutor;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn, Instrument};

pub struct GenerationFanOut {
    collaborator: Arc<dyn Collaborator>,
    executor: TrialExecutor,
    trial_count: usize,
    trial_timeout: Duration,
}

impl GenerationFanOut {
    pub fn new(
        collaborator: Arc<dyn Collaborator>,
        executor: TrialExecutor,
        trial_count: usize,
        trial_timeout: Duration,
    ) -> Self {
        Self {
            collaborator,
            executor,
            trial_count: trial_count.max(1),
            trial_timeout,
        }
    }

    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    /// Run every trial and return outcomes in dispatch order.
    ///
    /// `join_all` keeps each future's slot, so the order matches dispatch
    /// even when later trials finish first.
    pub async fn run(&self, prompt: &Prompt, document: &Document) -> Vec<TrialOutcome> {
        let trials = (0..self.trial_count).map(|trial| {
            self.run_trial(prompt, document)
                .instrument(tracing::info_span!("trial", trial))
        });

        join_all(trials).await
    }

    async fn run_trial(&self, prompt: &Prompt, document: &Document) -> TrialOutcome {
        let start = Instant::now();

        let completion = self.collaborator.complete(prompt);
        let envelope = match tokio::time::timeout(self.trial_timeout, completion).await {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(err)) => return failed(err, start),
            Err(_) => {
                return failed(
                    TrialError::CollaboratorError(format!(
                        "Timed out after {}ms",
                        self.trial_timeout.as_millis()
                    )),
                    start,
                )
            }
        };

        let outcome = self.executor.execute(&envelope, document);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            TrialOutcome::Success(value) => info!(elapsed_ms, %value, "Trial succeeded"),
            TrialOutcome::Failure(err) => {
                warn!(elapsed_ms, kind = err.kind(), error = %err, "Trial failed")
            }
        }

        outcome
    }
}

fn failed(err: TrialError, start: Instant) -> TrialOutcome {
    warn!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        kind = err.kind(),
        error = %err,
        "Trial failed"
    );
    TrialOutcome::Failure(err)
}
