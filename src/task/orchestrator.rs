//! Task orchestrator: background worker per submitted task.
//!
//! `submit` validates the identity, registers a `Processing` task, and
//! spawns a worker thread. The worker fetches the input column, resumes
//! from a recovery snapshot when one matches, processes cells sequentially
//! with per-cell failure isolation, checkpoints at interval boundaries,
//! and lands the task in `Completed` or `Failed`. Callers observe the task
//! through `poll` and collect the full result with `fetch_result`.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::config::OrchestratorConfig;
use crate::pipeline::runner::CellRunner;
use crate::pipeline::types::ProcessingIssue;
use crate::pipeline::ResultAggregator;

use super::provider::CellProvider;
use super::recovery::{RecoverySnapshot, RecoveryStore};
use super::store::TaskStore;
use super::types::{PollResponse, ProgressEvent, TaskIdentity, TaskState, TaskStatus};

/// Callback invoked by the worker as a task advances. Fired once per whole
/// percent of progress, plus the Started/Completed/Failed edges.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

#[derive(Error, Debug, Clone)]
pub enum SubmitError {
    #[error("task already processing for this input: {task_id}")]
    AlreadyProcessing { task_id: String },
}

/// Owns the task lifecycle. Clone-cheap: all collaborators sit behind Arcs
/// shared with the worker threads.
pub struct TaskOrchestrator {
    tasks: Arc<dyn TaskStore>,
    recovery: Arc<dyn RecoveryStore>,
    provider: Arc<dyn CellProvider>,
    runner: Arc<dyn CellRunner>,
    config: OrchestratorConfig,
    /// Serializes the identity-check/register pair in `submit` so two
    /// concurrent submissions of the same identity cannot both pass the
    /// duplicate check.
    submit_gate: Mutex<()>,
}

impl TaskOrchestrator {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        recovery: Arc<dyn RecoveryStore>,
        provider: Arc<dyn CellProvider>,
        runner: Arc<dyn CellRunner>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            tasks,
            recovery,
            provider,
            runner,
            config,
            submit_gate: Mutex::new(()),
        }
    }

    /// Submit a task for background processing. Returns the new task id.
    ///
    /// At most one task per identity may be in flight: a resubmission while
    /// a prior task with the same identity is still `Processing` is
    /// rejected. A terminal prior task is replaced, and any recovery
    /// snapshot for the identity seeds the new run.
    pub fn submit(&self, identity: TaskIdentity) -> Result<String, SubmitError> {
        self.submit_with_progress(identity, None)
    }

    pub fn submit_with_progress(
        &self,
        identity: TaskIdentity,
        on_progress: Option<ProgressCallback>,
    ) -> Result<String, SubmitError> {
        // The duplicate check and the registration must be one atomic step;
        // without the gate two racing submissions could both see no live
        // task and both spawn workers over the same recovery snapshot.
        let _gate = match self.submit_gate.lock() {
            Ok(gate) => gate,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(prior) = self.tasks.find_by_identity(&identity) {
            if !prior.status.is_terminal() {
                return Err(SubmitError::AlreadyProcessing {
                    task_id: prior.task_id,
                });
            }
            self.tasks.remove(&prior.task_id);
        }

        // total_cells is unknown until the worker fetches the input.
        let state = TaskState::new(identity.clone(), 0);
        let task_id = state.task_id.clone();
        self.tasks.put(state);

        let worker = Worker {
            tasks: Arc::clone(&self.tasks),
            recovery: Arc::clone(&self.recovery),
            provider: Arc::clone(&self.provider),
            runner: Arc::clone(&self.runner),
            config: self.config.clone(),
            task_id: task_id.clone(),
            identity,
            on_progress,
        };
        std::thread::spawn(move || worker.run());

        Ok(task_id)
    }

    /// Lightweight status for UI polling.
    pub fn poll(&self, task_id: &str) -> Option<PollResponse> {
        let state = self.tasks.get(task_id)?;
        let (message, summary) = match state.status {
            TaskStatus::Processing => (
                format!(
                    "processing cell {} of {}",
                    state.current_cell_index, state.total_cells
                ),
                None,
            ),
            TaskStatus::Completed => (
                "completed".to_string(),
                state.result.as_ref().map(|r| r.summary()),
            ),
            TaskStatus::Failed => (
                state
                    .error
                    .clone()
                    .unwrap_or_else(|| "failed".to_string()),
                None,
            ),
        };
        Some(PollResponse {
            status: state.status,
            progress: state.progress,
            message,
            summary,
        })
    }

    /// Full result of a completed task. `None` while processing or failed.
    pub fn fetch_result(&self, task_id: &str) -> Option<crate::pipeline::types::RunResult> {
        let state = self.tasks.get(task_id)?;
        if state.status != TaskStatus::Completed {
            return None;
        }
        state.result
    }

    pub fn task(&self, task_id: &str) -> Option<TaskState> {
        self.tasks.get(task_id)
    }
}

// ═══════════════════════════════════════════
// Background worker
// ═══════════════════════════════════════════

struct Worker {
    tasks: Arc<dyn TaskStore>,
    recovery: Arc<dyn RecoveryStore>,
    provider: Arc<dyn CellProvider>,
    runner: Arc<dyn CellRunner>,
    config: OrchestratorConfig,
    task_id: String,
    identity: TaskIdentity,
    on_progress: Option<ProgressCallback>,
}

impl Worker {
    fn run(self) {
        let input = match self.provider.fetch(&self.identity) {
            Ok(input) => input,
            Err(e) => {
                tracing::error!(task = %self.task_id, error = %e, "input fetch failed");
                let mut result = crate::pipeline::types::RunResult::empty();
                result.issues.push(ProcessingIssue::file_critical(
                    format!("could not load input column: {e}"),
                    "verify the file, sheet and column names and resubmit",
                ));
                self.update_state(|state| state.result = Some(result));
                self.fail(format!("could not load input column: {e}"));
                return;
            }
        };

        let total = input.cells.len();
        self.update_state(|state| state.total_cells = total);
        self.emit(ProgressEvent::Started {
            total_cells: total as u32,
        });

        let mut aggregator = ResultAggregator::new();
        let mut start_index = 0;

        match self.recovery.load(&self.identity) {
            Ok(Some(snapshot)) if snapshot.current_cell_index <= total => {
                start_index = snapshot.current_cell_index;
                tracing::info!(
                    task = %self.task_id,
                    resume_from = start_index,
                    "resuming from recovery snapshot"
                );
                aggregator.seed(
                    snapshot.claims,
                    snapshot.issues,
                    snapshot.language_distribution,
                    start_index,
                );
                if let Err(e) = self.recovery.delete(&self.identity) {
                    tracing::warn!(task = %self.task_id, error = %e, "stale snapshot not deleted");
                }
            }
            Ok(Some(_)) => {
                // Snapshot claims more cells than the input now has; the
                // underlying file must have changed. Start over.
                tracing::warn!(task = %self.task_id, "snapshot exceeds input length, restarting");
                if let Err(e) = self.recovery.delete(&self.identity) {
                    tracing::warn!(task = %self.task_id, error = %e, "stale snapshot not deleted");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(task = %self.task_id, error = %e, "snapshot load failed, starting fresh");
            }
        }

        let interval = self.config.checkpoint_interval(total);
        let mut last_percent = percent_of(start_index, total);

        for index in start_index..total {
            match self.runner.run_cell(index, &input.cells[index], input.patent_for(index)) {
                Ok(outcome) => {
                    for claim in outcome.claims {
                        aggregator.record_claim(claim);
                    }
                    for issue in outcome.issues {
                        aggregator.record_issue(issue);
                    }
                }
                Err(e) => {
                    // One bad cell never takes the task down.
                    tracing::warn!(task = %self.task_id, cell = index, error = %e, "cell failed");
                    aggregator.record_issue(ProcessingIssue::cell_error(
                        index,
                        e.to_string(),
                        "inspect the cell content and resubmit if corrected",
                    ));
                }
            }
            aggregator.note_cell_done();

            let done = index + 1;
            let percent = percent_of(done, total);
            self.update_state(|state| {
                state.current_cell_index = done;
                state.progress = state.progress.max(percent);
            });
            if percent != last_percent {
                last_percent = percent;
                self.emit(ProgressEvent::Progress {
                    completed: done as u32,
                    total: total as u32,
                    percent,
                });
            }

            // Runs shorter than the interval would otherwise never hit an
            // interval boundary; give them one checkpoint before the final
            // cell so a crash during that cell can still resume.
            let at_interval = done % interval == 0;
            let tiny_run_mark = total <= interval && done + 1 == total;
            if done < total && (at_interval || tiny_run_mark) {
                self.checkpoint(&aggregator, done);
            }
        }

        let result = aggregator.finish();
        if let Err(e) = self.recovery.delete(&self.identity) {
            tracing::warn!(task = %self.task_id, error = %e, "completed-task snapshot not deleted");
        }

        let claims_extracted = result.claims_extracted;
        self.update_state(|state| {
            state.status = TaskStatus::Completed;
            state.progress = 100;
            state.current_cell_index = total;
            state.result = Some(result.clone());
        });
        self.emit(ProgressEvent::Completed { claims_extracted });
        tracing::info!(
            task = %self.task_id,
            cells = total,
            claims = claims_extracted,
            "task completed"
        );
    }

    fn checkpoint(&self, aggregator: &ResultAggregator, cells_done: usize) {
        let snapshot = RecoverySnapshot::new(
            self.identity.clone(),
            aggregator.claims().to_vec(),
            aggregator.issues().to_vec(),
            aggregator.language_distribution().clone(),
            cells_done,
        );
        // Checkpointing is best effort; a failed save costs at most one
        // interval of rework after a crash.
        if let Err(e) = self.recovery.save(&snapshot) {
            tracing::warn!(task = %self.task_id, error = %e, "checkpoint save failed");
        }
    }

    fn fail(&self, error: String) {
        self.update_state(|state| {
            state.status = TaskStatus::Failed;
            state.error = Some(error.clone());
        });
        self.emit(ProgressEvent::Failed { error });
    }

    fn update_state(&self, apply: impl FnOnce(&mut TaskState)) {
        if let Some(mut state) = self.tasks.get(&self.task_id) {
            apply(&mut state);
            state.touch();
            self.tasks.put(state);
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }
}

fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total) as u8
}
