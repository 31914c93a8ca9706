//! Queue Service
//!
//! A FIFO of submitted jobs drained one at a time through the pipeline.
//! Submitting never waits for the pipeline; the first submission into an
//! idle queue starts a drain task that runs until the queue is empty.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use recast_core::domain::job::{Job, JobOutcome, JobStage, StageResult};
use recast_core::dto::job::{QueueItem, QueueStatus, RunningJob};
use tokio::sync::Notify;

use crate::service::pipeline::JobPipeline;

#[derive(Default)]
struct QueueState {
    queue: VecDeque<Job>,
    current: Option<RunningJob>,
    /// A drain task exists; guards against starting a second one
    draining: bool,
    history: VecDeque<JobOutcome>,
}

/// Owns the queue and the single execution slot
pub struct Orchestrator {
    state: Mutex<QueueState>,
    pipeline: Arc<dyn JobPipeline>,
    idle: Notify,
    history_limit: usize,
}

impl Orchestrator {
    /// # Arguments
    /// * `pipeline` - Stage implementations
    /// * `history_limit` - Number of finished jobs kept for status reports
    pub fn new(pipeline: Arc<dyn JobPipeline>, history_limit: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            pipeline,
            idle: Notify::new(),
            history_limit,
        })
    }

    /// Queue a job and make sure a drain task is running
    ///
    /// # Returns
    /// Number of jobs ahead of this one, counting a running job
    pub fn submit(self: &Arc<Self>, job: Job) -> usize {
        let (position, start_drain) = {
            let mut state = self.state.lock();
            let position = state.queue.len() + usize::from(state.current.is_some());
            tracing::info!("Queued {} (run {}) at position {}", job.test_name, job.run_id, position);
            state.queue.push_back(job);
            let start_drain = !state.draining;
            state.draining = true;
            (position, start_drain)
        };

        if start_drain {
            let orchestrator = Arc::clone(self);
            tokio::spawn(async move { orchestrator.drain().await });
        }
        position
    }

    /// Snapshot of the queue; has no side effects
    pub fn status(&self) -> QueueStatus {
        let state = self.state.lock();
        QueueStatus {
            queue_length: state.queue.len(),
            queue_items: state.queue.iter().map(QueueItem::from).collect(),
            current_running: state.current.clone(),
            is_processing: state.draining,
            recent: state.history.iter().cloned().collect(),
        }
    }

    /// Resolve once no drain task is running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.state.lock().draining {
                return;
            }
            notified.await;
        }
    }

    // =============================================================================
    // Drain loop
    // =============================================================================

    async fn drain(self: Arc<Self>) {
        loop {
            let job = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(job) => {
                        state.current = Some(RunningJob::start(&job));
                        job
                    }
                    None => {
                        state.current = None;
                        state.draining = false;
                        break;
                    }
                }
            };

            tracing::info!("Starting {} (run {})", job.test_name, job.run_id);

            // Own task per job so a panicking stage cannot take the loop down
            let orchestrator = Arc::clone(&self);
            let snapshot = job.clone();
            let outcome = match tokio::spawn(async move { orchestrator.run_job(job).await }).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Job {} aborted: {}", snapshot.test_name, e);
                    let stage = self
                        .state
                        .lock()
                        .current
                        .as_ref()
                        .map(|current| current.stage)
                        .unwrap_or(JobStage::Queued);
                    let mut outcome = JobOutcome::begin(&snapshot);
                    outcome.record(stage, StageResult::failed(format!("Job aborted: {}", e)));
                    outcome.finish()
                }
            };

            let mut state = self.state.lock();
            state.current = None;
            state.history.push_back(outcome);
            while state.history.len() > self.history_limit {
                state.history.pop_front();
            }
        }

        tracing::info!("Queue is empty");
        self.idle.notify_waiters();
    }

    fn set_stage(&self, stage: JobStage) {
        if let Some(current) = self.state.lock().current.as_mut() {
            current.stage = stage;
        }
    }

    /// Run every stage of one job under the failure policy
    async fn run_job(&self, job: Job) -> JobOutcome {
        let mut outcome = JobOutcome::begin(&job);

        self.set_stage(JobStage::Persisting);
        let recording = match self.pipeline.persist(&job).await {
            Ok(path) => {
                outcome.record(
                    JobStage::Persisting,
                    StageResult::ok(format!("Saved {}", path.display())),
                );
                path
            }
            Err(e) => {
                tracing::error!("Failed to persist {}: {:#}", job.test_name, e);
                outcome.record(JobStage::Persisting, StageResult::failed(format!("{:#}", e)));
                return self.complete(outcome);
            }
        };

        self.set_stage(JobStage::Compiling);
        let script = match self.pipeline.compile(&job, &recording).await {
            Ok(path) => {
                outcome.record(
                    JobStage::Compiling,
                    StageResult::ok(format!("Compiled {}", path.display())),
                );
                path
            }
            Err(e) => {
                tracing::error!("Failed to compile {}: {:#}", job.test_name, e);
                outcome.record(JobStage::Compiling, StageResult::failed(format!("{:#}", e)));
                return self.complete(outcome);
            }
        };

        self.set_stage(JobStage::Executing);
        let executed = match self.pipeline.execute(&job, &script).await {
            Ok(result) => result,
            Err(e) => StageResult::failed(format!("{:#}", e)),
        };
        if executed.ok {
            tracing::info!("Runner finished {}", job.test_name);
        } else {
            tracing::warn!("Runner failed for {}, reporting anyway: {}", job.test_name, executed.message);
        }
        outcome.record(JobStage::Executing, executed);

        self.set_stage(JobStage::Reporting);
        let reported = match self.pipeline.report(&job).await {
            Ok(result) => result,
            Err(e) => StageResult::failed(format!("{:#}", e)),
        };
        if reported.ok {
            tracing::info!("Reported {}: {}", job.test_name, reported.message);
        } else {
            tracing::error!("Failed to report {}: {}", job.test_name, reported.message);
        }
        outcome.record(JobStage::Reporting, reported);

        self.complete(outcome)
    }

    fn complete(&self, outcome: JobOutcome) -> JobOutcome {
        self.set_stage(JobStage::Done);
        let outcome = outcome.finish();
        tracing::info!(
            "Finished {} (run {}), failed stages: {:?}",
            outcome.test_name,
            outcome.run_id,
            outcome.failed_stages()
        );
        outcome
    }
}
