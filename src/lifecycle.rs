//! Job lifecycle manager: the single owner of the live [`Job`] record.
//!
//! A submission creates a fresh record and, once the service accepts it, a
//! polling task that checks `GET /status/{job_id}` on a fixed cadence. The
//! task is cancelled through a [`CancellationToken`] and awaited before any
//! new record is installed. Every write the task makes goes through
//! [`watch::Sender::send_if_modified`] and is discarded unless the record
//! still carries the task's generation and job id.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::{
    ApiError, JobStatusResponse, RemixApi, RemixRequest, RemoteStatus, ResultLocator,
    with_deadline,
};
use crate::state_machine::{Job, JobState, StateMachine, StatusUpdate, Transition};

/// Failure text for a submission abandoned before the service answered.
pub const SUBMISSION_CANCELLED: &str = "submission cancelled";

/// Default cadence between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default deadline for a single network call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// What happened to a call to [`JobLifecycleManager::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service accepted the job and polling has started.
    Started { job_id: String },
    /// The submission failed; the job is in `Failed` with this message.
    Failed { message: String },
    /// A job was already in flight; nothing was sent.
    Ignored { state: JobState },
}

struct PollHandle {
    job_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives one job at a time through submission and polling.
pub struct JobLifecycleManager<C> {
    client: Arc<C>,
    settings: LifecycleSettings,
    job: Arc<watch::Sender<Job>>,
    generation: u64,
    poller: Option<PollHandle>,
}

impl<C: RemixApi + 'static> JobLifecycleManager<C> {
    pub fn new(client: Arc<C>, settings: LifecycleSettings) -> Self {
        let (job, _) = watch::channel(Job::idle(0));
        Self {
            client,
            settings,
            job: Arc::new(job),
            generation: 0,
            poller: None,
        }
    }

    /// A copy of the live record.
    pub fn snapshot(&self) -> Job {
        self.job.borrow().clone()
    }

    /// Read-only view that is notified on every applied change.
    pub fn subscribe(&self) -> watch::Receiver<Job> {
        self.job.subscribe()
    }

    /// The download locator, available only once the job completed.
    pub fn result_reference(&self) -> Option<ResultLocator> {
        let job = self.job.borrow();
        match job.state {
            JobState::Completed => job.result.clone(),
            _ => None,
        }
    }

    /// Submit a new job, superseding a finished one.
    ///
    /// Ignored while the current job is submitting or processing.
    pub async fn submit(&mut self, request: RemixRequest) -> SubmitOutcome {
        let current = self.job.borrow().state;
        if current.is_in_flight() {
            tracing::debug!(state = %current, "Submission ignored, a job is already in flight");
            return SubmitOutcome::Ignored { state: current };
        }

        self.stop_polling().await;
        self.generation += 1;
        let generation = self.generation;
        self.job.send_replace(Job::submitting(generation));
        let _pending = PendingSubmit {
            job: Arc::clone(&self.job),
            generation,
        };
        tracing::info!(
            generation,
            file_id = %request.artifact_id,
            style = %request.style_id,
            energy = request.energy,
            brightness = request.brightness,
            "Submitting remix job",
        );

        let submitted = with_deadline(
            self.settings.request_timeout,
            self.client.submit_job(&request),
        )
        .await;

        match submitted {
            Ok(accepted) => {
                self.job.send_modify(|job| {
                    StateMachine::accept(job, &accepted.job_id, accepted.progress);
                });
                tracing::info!(
                    job_id = %accepted.job_id,
                    generation,
                    status = %accepted.status,
                    "Remix job accepted",
                );
                self.start_polling(accepted.job_id.clone(), generation);
                SubmitOutcome::Started {
                    job_id: accepted.job_id,
                }
            }
            Err(err) => {
                let message = err.to_string();
                self.job.send_modify(|job| {
                    StateMachine::reject(job, &message);
                });
                tracing::warn!(generation, error = %err, "Remix submission failed");
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Discard the current job without submitting a new one.
    ///
    /// Polling is stopped before the fresh `Idle` record is installed.
    pub async fn reset(&mut self) {
        self.stop_polling().await;
        let superseded = self.job.borrow().job_id.clone();
        self.generation += 1;
        self.job.send_replace(Job::idle(self.generation));
        if let Some(job_id) = superseded {
            tracing::info!(job_id = %job_id, generation = self.generation, "Superseded job discarded");
        }
    }

    /// Wait until no job is in flight and return the settled record.
    pub async fn wait_until_settled(&self) -> Job {
        let mut rx = self.job.subscribe();
        match rx.wait_for(|job| !job.state.is_in_flight()).await {
            Ok(job) => job.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Stop polling and release the manager.
    pub async fn shutdown(mut self) {
        self.stop_polling().await;
        tracing::debug!(generation = self.generation, "Lifecycle manager shut down");
    }

    fn start_polling(&mut self, job_id: String, generation: u64) {
        let cancel = CancellationToken::new();
        let poller = Poller {
            client: Arc::clone(&self.client),
            job: Arc::clone(&self.job),
            job_id: job_id.clone(),
            generation,
            settings: self.settings,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(poller.run());
        self.poller = Some(PollHandle {
            job_id,
            cancel,
            task,
        });
    }

    async fn stop_polling(&mut self) {
        let Some(handle) = self.poller.take() else {
            return;
        };
        handle.cancel.cancel();
        if let Err(err) = handle.task.await
            && !err.is_cancelled()
        {
            tracing::error!(job_id = %handle.job_id, error = %err, "Polling task panicked");
        }
        tracing::debug!(job_id = %handle.job_id, "Polling stopped");
    }
}

impl<C> Drop for JobLifecycleManager<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.cancel.cancel();
            handle.task.abort();
        }
    }
}

/// Fails a submission whose future was dropped before the service answered.
struct PendingSubmit {
    job: Arc<watch::Sender<Job>>,
    generation: u64,
}

impl Drop for PendingSubmit {
    fn drop(&mut self) {
        let cancelled = self.job.send_if_modified(|job| {
            if job.generation != self.generation || job.state != JobState::Submitting {
                return false;
            }
            StateMachine::reject(job, SUBMISSION_CANCELLED);
            true
        });
        if cancelled {
            tracing::warn!(generation = self.generation, "Remix submission cancelled");
        }
    }
}

enum Tick {
    Continue,
    Stop,
}

/// Polling loop for one job. Owned by its spawned task.
struct Poller<C> {
    client: Arc<C>,
    job: Arc<watch::Sender<Job>>,
    job_id: String,
    generation: u64,
    settings: LifecycleSettings,
    cancel: CancellationToken,
}

impl<C: RemixApi> Poller<C> {
    async fn run(self) {
        tracing::debug!(job_id = %self.job_id, generation = self.generation, "Polling started");
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = sleep(self.settings.poll_interval) => {}
            }

            let Some(polled) = self.bounded(self.client.fetch_job_status(&self.job_id)).await
            else {
                break;
            };

            if let Tick::Stop = self.tick(polled).await {
                break;
            }
        }
    }

    /// Run one network call under the request deadline. `None` if cancelled.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Option<Result<T, ApiError>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = with_deadline(self.settings.request_timeout, call) => Some(result),
        }
    }

    async fn tick(&self, polled: Result<JobStatusResponse, ApiError>) -> Tick {
        let status = match polled {
            Ok(status) => status,
            Err(err) if err.is_transient() => {
                tracing::warn!(job_id = %self.job_id, error = %err, "Status poll failed, retrying next tick");
                return Tick::Continue;
            }
            Err(err) => {
                tracing::error!(job_id = %self.job_id, error = %err, "Status poll failed permanently");
                return self.apply(StatusUpdate::Failed {
                    message: Some(err.to_string()),
                });
            }
        };

        let update = match status.remote_status() {
            RemoteStatus::Processing => StatusUpdate::Progress {
                progress: status.progress,
                stage: status.stage(),
            },
            RemoteStatus::Failed => StatusUpdate::Failed {
                message: status.error.clone(),
            },
            RemoteStatus::Unknown(raw) => {
                tracing::warn!(job_id = %self.job_id, status = %raw, "Unrecognized job status, still processing");
                StatusUpdate::Unrecognized(raw)
            }
            RemoteStatus::Completed => {
                let Some(reference) = self
                    .bounded(self.client.fetch_result_reference(&self.job_id))
                    .await
                else {
                    return Tick::Stop;
                };
                match reference {
                    Ok(reference) => StatusUpdate::Completed {
                        mode: status.mode(),
                        stage: status.stage(),
                        reference,
                    },
                    Err(err) if err.is_transient() => {
                        tracing::warn!(job_id = %self.job_id, error = %err, "Result reference unavailable, retrying next tick");
                        return Tick::Continue;
                    }
                    Err(err) => StatusUpdate::Failed {
                        message: Some(format!("result unavailable: {err}")),
                    },
                }
            }
        };

        self.apply(update)
    }

    /// Write `update` into the live record if it is still this poller's job.
    fn apply(&self, update: StatusUpdate) -> Tick {
        let mut transition = None;
        self.job.send_if_modified(|job| {
            if !job.is_tracking(self.generation, &self.job_id) {
                return false;
            }
            let t = StateMachine::apply(job, update);
            let modified = !matches!(t, Transition::Invalid { .. });
            transition = Some(t);
            modified
        });

        match transition {
            None => {
                tracing::debug!(job_id = %self.job_id, generation = self.generation, "Discarded stale status for superseded job");
                Tick::Stop
            }
            Some(Transition::Stay) => Tick::Continue,
            Some(Transition::Complete(outcome)) => {
                tracing::info!(job_id = %self.job_id, ?outcome, "Remix job finished");
                Tick::Stop
            }
            Some(Transition::Invalid { from } | Transition::Next(from)) => {
                tracing::debug!(job_id = %self.job_id, state = %from, "Job no longer processing");
                Tick::Stop
            }
        }
    }
}
