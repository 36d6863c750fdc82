use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::JobState;
use crate::api::ResultLocator;

/// Message recorded when the service reports a failure without saying why.
pub const FALLBACK_FAILURE_MESSAGE: &str = "remix job failed";

/// The result of a job that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOutcome {
    Success,
    Failure(String),
}

/// The single live job tracked by the lifecycle manager.
///
/// A fresh record replaces the previous one on every submission; records are
/// never merged. `generation` identifies the record across that replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub generation: u64,
    /// Assigned by the service once the submission is accepted.
    pub job_id: Option<String>,
    pub state: JobState,
    /// Percentage in `[0, 100]`, only meaningful while processing.
    pub progress: u8,
    pub stage_description: Option<String>,
    pub result_mode: Option<String>,
    /// Present iff `state` is `Failed`.
    pub error_message: Option<String>,
    /// Present iff `state` is `Completed`.
    pub result: Option<ResultLocator>,
    pub state_history: Vec<JobState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn idle(generation: u64) -> Self {
        let now = Utc::now();
        Self {
            generation,
            job_id: None,
            state: JobState::Idle,
            progress: 0,
            stage_description: None,
            result_mode: None,
            error_message: None,
            result: None,
            state_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn submitting(generation: u64) -> Self {
        let mut job = Self::idle(generation);
        job.state_history.push(JobState::Idle);
        job.state = JobState::Submitting;
        job
    }

    /// `true` when `job_id` is the service id of this record.
    pub fn is_tracking(&self, generation: u64, job_id: &str) -> bool {
        self.generation == generation && self.job_id.as_deref() == Some(job_id)
    }

    pub fn outcome(&self) -> Option<JobOutcome> {
        if !self.state.is_terminal() {
            return None;
        }
        match self.state {
            JobState::Completed => Some(JobOutcome::Success),
            JobState::Failed => Some(JobOutcome::Failure(
                self.error_message
                    .clone()
                    .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string()),
            )),
            _ => None,
        }
    }
}

/// Clamp a service-reported progress value into `[0, 100]`.
pub fn clamp_progress(reported: i64) -> u8 {
    reported.clamp(0, 100) as u8
}
