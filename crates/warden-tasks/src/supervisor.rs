use tracing::{info, warn};
use warden_core::Result;

use crate::facade::SelfUpdater;

/// Update the supervisor itself when a newer version is published.
///
/// Never runs on a development channel. Unlike addon updates, a failed
/// self-update is returned to the caller.
pub async fn update_supervisor(updater: &dyn SelfUpdater) -> Result<()> {
    if !updater.needs_update() {
        return Ok(());
    }

    if updater.dev_channel() {
        warn!("ignoring supervisor update on dev channel");
        return Ok(());
    }

    info!(
        current = %updater.version(),
        latest = %updater.latest_version(),
        "found new supervisor version"
    );
    updater.update().await
}
