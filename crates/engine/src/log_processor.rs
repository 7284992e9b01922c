// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applies job output to step rows.
//!
//! Markers move steps through running and succeeded and record exit
//! codes. Other lines are stored as log chunks of the step that is
//! currently running; output outside any step is dropped.

use crate::log_batcher::LogBatcher;
use tracing::{debug, warn};
use xci_core::{BuildId, BuildStepId, Clock, NewLogChunk, StepStatus, StepUpdate};
use xci_script::Marker;
use xci_storage::BuildStore;

pub struct LogProcessor<S, K> {
    store: S,
    clock: K,
    build_id: BuildId,
    job_name: String,
    current: Option<BuildStepId>,
    batcher: LogBatcher<S>,
}

impl<S: BuildStore, K: Clock> LogProcessor<S, K> {
    pub fn new(store: S, clock: K, build_id: BuildId, job_name: &str, batch: usize) -> Self {
        Self {
            batcher: LogBatcher::new(store.clone(), batch),
            store,
            clock,
            build_id,
            job_name: job_name.to_string(),
            current: None,
        }
    }

    /// Step whose output is currently being captured.
    pub fn current_step(&self) -> Option<BuildStepId> {
        self.current
    }

    pub async fn on_line(&mut self, line: &str) {
        match Marker::parse(line) {
            Marker::Begin { step } => {
                self.batcher.flush().await;
                // Composite sub-steps have no rows; their output stays with the enclosing step.
                if let Some(id) = self.step_id(step).await {
                    self.update(id, StepUpdate::started(self.clock.now())).await;
                    self.current = Some(id);
                }
            }
            Marker::End { step } => {
                self.batcher.flush().await;
                if let Some(id) = self.step_id(step).await {
                    let update = StepUpdate::finished(StepStatus::Succeeded, self.clock.now());
                    self.update(id, update).await;
                    if self.current == Some(id) {
                        self.current = None;
                    }
                }
            }
            Marker::Exit { step, code } => {
                let Some(code) = code else {
                    warn!(job = %self.job_name, step, line, "exit marker without a code");
                    return;
                };
                if let Some(id) = self.step_id(step).await {
                    self.update(id, StepUpdate::exit_code(code)).await;
                }
            }
            Marker::Plain(text) => match self.current {
                Some(id) => {
                    self.batcher
                        .push(NewLogChunk {
                            build_step_id: id,
                            content: text.to_string(),
                            created_at: self.clock.now(),
                        })
                        .await;
                }
                None => debug!(job = %self.job_name, "dropping output outside any step"),
            },
        }
    }

    /// Write any buffered output.
    pub async fn finish(&mut self) {
        self.batcher.flush().await;
    }

    async fn step_id(&self, step: &str) -> Option<BuildStepId> {
        let lookup = self.store.find_step(self.build_id, &self.job_name, step);
        match lookup.await {
            Ok(Some(row)) => Some(row.id),
            Ok(None) => {
                debug!(job = %self.job_name, step, "marker for unknown step");
                None
            }
            Err(e) => {
                warn!(job = %self.job_name, step, error = %e, "step lookup failed");
                None
            }
        }
    }

    async fn update(&self, id: BuildStepId, update: StepUpdate) {
        if let Err(e) = self.store.update_step(id, update).await {
            warn!(job = %self.job_name, step_id = %id, error = %e, "step update failed");
        }
    }
}

#[cfg(test)]
#[path = "log_processor_tests.rs"]
mod tests;
