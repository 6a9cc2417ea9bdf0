//! Narrow interfaces to the collaborators the jobs act on.
//!
//! Each job depends only on the trait it needs; concrete implementations
//! live with the subsystem that owns them and are injected through
//! [`crate::Collaborators`].

use std::sync::Arc;

use async_trait::async_trait;
use warden_core::Result;

/// Anything that can refresh its view of the world on a timer.
#[async_trait]
pub trait Reloadable: Send + Sync {
    /// Label used in logs; the reload job is named `reload_<name>`.
    fn name(&self) -> &str;

    async fn reload(&self) -> Result<()>;
}

/// An installable addon as seen by the auto-update job.
#[async_trait]
pub trait Addon: Send + Sync {
    fn slug(&self) -> &str;

    fn is_installed(&self) -> bool;

    /// User opted in to unattended updates.
    fn auto_update(&self) -> bool;

    fn version_installed(&self) -> Option<String>;

    /// Latest version known to the addon registry.
    fn version_latest(&self) -> String;

    /// Whether the current options still validate against the latest
    /// version's schema.
    fn passes_schema_check(&self) -> bool;

    async fn update(&self) -> Result<()>;
}

/// Registry of installed and available addons.
#[async_trait]
pub trait AddonManager: Reloadable {
    fn list_addons(&self) -> Vec<Arc<dyn Addon>>;
}

/// The supervisor's own update channel.
#[async_trait]
pub trait SelfUpdater: Send + Sync {
    fn version(&self) -> String;

    fn latest_version(&self) -> String;

    /// Any difference from the published version counts, including
    /// rollbacks and pre-release to final.
    fn needs_update(&self) -> bool {
        self.version() != self.latest_version()
    }

    /// Running from a development channel; self-update is never attempted.
    fn dev_channel(&self) -> bool;

    async fn update(&self) -> Result<()>;
}

/// Control surface of the supervised service.
#[async_trait]
pub trait ManagedService: Send + Sync {
    fn name(&self) -> &str;

    async fn is_initialized(&self) -> bool;

    fn watchdog_enabled(&self) -> bool;

    /// A start/stop/update/restart is currently underway.
    fn in_progress(&self) -> bool;

    async fn is_running(&self) -> bool;

    async fn check_api_health(&self) -> bool;

    async fn start(&self) -> Result<()>;

    async fn restart(&self) -> Result<()>;
}
