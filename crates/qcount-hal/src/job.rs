//! Job lifecycle.
//!
//! ```text
//!   Queued ──→ Running ──→ Completed(result)
//!     │           └──────→ Failed(reason)
//!     └──────────────────→ Cancelled
//! ```
//!
//! A [`Job`] owns its status and, once completed, its [`ExecutionResult`].
//! Every transition goes through a method that refuses to leave a terminal
//! state, so a finished job never changes again.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};
use crate::result::ExecutionResult;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    /// Execution stopped with an error message.
    Failed(String),
    Cancelled,
}

impl JobStatus {
    /// Completed, failed or cancelled.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Queued or running.
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => f.write_str("Queued"),
            JobStatus::Running => f.write_str("Running"),
            JobStatus::Completed => f.write_str("Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// One submitted circuit: its shot count, timing and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Backend the job was submitted to.
    pub backend: String,
    pub shots: u32,
    status: JobStatus,
    submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ExecutionResult>,
}

impl Job {
    /// A freshly queued job.
    pub fn new(id: impl Into<JobId>, backend: impl Into<String>, shots: u32) -> Self {
        Self {
            id: id.into(),
            backend: backend.into(),
            shots,
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
        }
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Time from start to finish, once both happened.
    pub fn run_time(&self) -> Option<TimeDelta> {
        Some(self.finished_at? - self.started_at?)
    }

    /// Queued -> Running.
    pub fn start(&mut self) -> HalResult<()> {
        if self.status != JobStatus::Queued {
            return Err(self.illegal("start"));
        }
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Running -> Completed, storing the result.
    ///
    /// The result must account for exactly the job's shots.
    pub fn complete(&mut self, result: ExecutionResult) -> HalResult<()> {
        if self.status != JobStatus::Running {
            return Err(self.illegal("complete"));
        }
        if result.shots != self.shots {
            return Err(HalError::InvalidCounts(format!(
                "job {} asked for {} shots, result has {}",
                self.id, self.shots, result.shots
            )));
        }
        result.validate()?;
        self.result = Some(result);
        self.finish(JobStatus::Completed);
        Ok(())
    }

    /// Running -> Failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> HalResult<()> {
        if self.status != JobStatus::Running {
            return Err(self.illegal("fail"));
        }
        self.finish(JobStatus::Failed(reason.into()));
        Ok(())
    }

    /// Cancel a pending job. Returns `false` if it had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.finish(JobStatus::Cancelled);
        true
    }

    /// The stored result, or the error matching the job's status.
    pub fn result(&self) -> HalResult<&ExecutionResult> {
        match (&self.status, &self.result) {
            (JobStatus::Completed, Some(result)) => Ok(result),
            (JobStatus::Failed(msg), _) => Err(HalError::JobFailed(msg.clone())),
            (JobStatus::Cancelled, _) => Err(HalError::JobCancelled),
            (status, _) => Err(HalError::Backend(format!(
                "job {} has no result yet (status: {status})",
                self.id
            ))),
        }
    }

    fn finish(&mut self, status: JobStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    fn illegal(&self, action: &str) -> HalError {
        HalError::Backend(format!(
            "cannot {action} job {} in state {}",
            self.id, self.status
        ))
    }
}
