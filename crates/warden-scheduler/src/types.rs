use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Future produced by one invocation of a job callback.
pub type JobFuture = Pin<Box<dyn Future<Output = warden_core::Result<()>> + Send>>;

/// Zero-argument async action run on every tick.
pub type JobCallback = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Opaque handle returned by registration; used only to remove the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(pub(crate) Uuid);

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Sleeping until its next tick.
    Pending,
    /// Callback currently executing.
    Running,
    /// Last invocation returned an error. The job stays scheduled.
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Point-in-time view of a registered job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    /// Human-readable label.
    pub name: String,
    pub interval_secs: u64,
    pub status: JobStatus,
    /// Number of finished invocations, successful or not.
    pub run_count: u64,
    /// Start of the most recent invocation.
    pub last_run: Option<DateTime<Utc>>,
    /// Error message of the most recent failed invocation.
    pub last_error: Option<String>,
}
