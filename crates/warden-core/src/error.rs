use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Service error ({service}): {reason}")]
    Service { service: String, reason: String },

    #[error("Addon error ({slug}): {reason}")]
    Addon { slug: String, reason: String },

    #[error("Update failed: {0}")]
    Update(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    /// Short, stable error code for log fields and status reports.
    pub fn code(&self) -> &'static str {
        match self {
            WardenError::Config(_) => "CONFIG_ERROR",
            WardenError::Service { .. } => "SERVICE_ERROR",
            WardenError::Addon { .. } => "ADDON_ERROR",
            WardenError::Update(_) => "UPDATE_ERROR",
            WardenError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;
