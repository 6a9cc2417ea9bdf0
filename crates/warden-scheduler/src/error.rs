use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The provided interval is invalid (zero seconds).
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Registration attempted outside a Tokio runtime.
    #[error("No Tokio runtime available to drive job {name}")]
    NoRuntime { name: String },

    /// The scheduler has been shut down and accepts no new jobs.
    #[error("Scheduler is stopped")]
    Stopped,

    /// No job with the given ID exists.
    #[error("Job not found: {id}")]
    JobNotFound { id: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
