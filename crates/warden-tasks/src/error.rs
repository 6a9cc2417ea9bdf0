use thiserror::Error;

#[derive(Debug, Error)]
pub enum TasksError {
    /// The scheduler refused a registration; fatal at startup.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] warden_scheduler::SchedulerError),

    #[error("Configuration error: {0}")]
    Config(#[from] warden_core::WardenError),
}

pub type Result<T> = std::result::Result<T, TasksError>;
