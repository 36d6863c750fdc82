use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::job::{FALLBACK_FAILURE_MESSAGE, Job, JobOutcome, clamp_progress};
use crate::api::ResultLocator;

/// Lifecycle states of a remix job.
///
/// Each job flows through: IDLE → SUBMITTING → PROCESSING → COMPLETED | FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    Submitting,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    /// A submission or a polling loop is active.
    pub fn is_in_flight(self) -> bool {
        matches!(self, JobState::Submitting | JobState::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Idle => write!(f, "IDLE"),
            JobState::Submitting => write!(f, "SUBMITTING"),
            JobState::Processing => write!(f, "PROCESSING"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

/// What a status poll told us, already interpreted for the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Progress {
        progress: i64,
        stage: Option<String>,
    },
    Completed {
        mode: Option<String>,
        stage: Option<String>,
        reference: ResultLocator,
    },
    Failed {
        message: Option<String>,
    },
    /// A status string the service added after this client was written.
    Unrecognized(String),
}

/// The result of evaluating a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Advance to the next non-terminal state.
    Next(JobState),
    /// Still processing; progress or stage may have moved.
    Stay,
    /// The job reached a terminal state.
    Complete(JobOutcome),
    /// The event does not apply in the job's current state; nothing changed.
    Invalid { from: JobState },
}

/// Applies lifecycle events to a [`Job`] record.
pub struct StateMachine;

impl StateMachine {
    /// The service accepted the submission: SUBMITTING → PROCESSING.
    pub fn accept(job: &mut Job, job_id: &str, reported_progress: i64) -> Transition {
        if job.state != JobState::Submitting {
            return Transition::Invalid { from: job.state };
        }
        job.job_id = Some(job_id.to_string());
        job.progress = clamp_progress(reported_progress);
        Self::enter(job, JobState::Processing);
        Transition::Next(JobState::Processing)
    }

    /// The submission itself failed: SUBMITTING → FAILED.
    pub fn reject(job: &mut Job, message: &str) -> Transition {
        if job.state != JobState::Submitting {
            return Transition::Invalid { from: job.state };
        }
        Self::fail(job, Some(message.to_string()))
    }

    /// Apply a polled status to a PROCESSING job.
    ///
    /// - Progress never decreases and is clamped to `[0, 100]`.
    /// - An unrecognized status keeps the job processing with progress unchanged.
    /// - Completion and failure are terminal.
    pub fn apply(job: &mut Job, update: StatusUpdate) -> Transition {
        if job.state != JobState::Processing {
            return Transition::Invalid { from: job.state };
        }

        match update {
            StatusUpdate::Progress { progress, stage } => {
                job.progress = job.progress.max(clamp_progress(progress));
                if stage.is_some() {
                    job.stage_description = stage;
                }
                job.updated_at = Utc::now();
                Transition::Stay
            }
            StatusUpdate::Unrecognized(raw) => {
                tracing::debug!(status = %raw, progress = job.progress, "Holding progress");
                job.updated_at = Utc::now();
                Transition::Stay
            }
            StatusUpdate::Completed {
                mode,
                stage,
                reference,
            } => {
                job.progress = 100;
                job.result_mode = mode;
                if stage.is_some() {
                    job.stage_description = stage;
                }
                job.result = Some(reference);
                Self::enter(job, JobState::Completed);
                Transition::Complete(JobOutcome::Success)
            }
            StatusUpdate::Failed { message } => Self::fail(job, message),
        }
    }

    fn fail(job: &mut Job, message: Option<String>) -> Transition {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string());
        job.error_message = Some(message.clone());
        Self::enter(job, JobState::Failed);
        Transition::Complete(JobOutcome::Failure(message))
    }

    fn enter(job: &mut Job, next: JobState) {
        job.state_history.push(job.state);
        job.state = next;
        job.updated_at = Utc::now();
    }
}
