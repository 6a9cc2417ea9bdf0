use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};
use warden_core::Result;

use crate::facade::{Addon, AddonManager};

/// Update every installed addon that opted in and has a newer version.
///
/// Addons whose options fail the new schema are skipped with a warning.
/// Eligible updates run concurrently and the job waits for all of them; a
/// failed update is logged and never aborts the others.
pub async fn update_addons(manager: &dyn AddonManager) -> Result<()> {
    let mut queued: Vec<Arc<dyn Addon>> = Vec::new();

    for addon in manager.list_addons() {
        if !addon.is_installed() || !addon.auto_update() {
            continue;
        }

        let latest = addon.version_latest();
        if addon.version_installed().as_deref() == Some(latest.as_str()) {
            continue;
        }

        if addon.passes_schema_check() {
            queued.push(addon);
        } else {
            warn!(
                addon = addon.slug(),
                "addon will be ignored, schema tests fail"
            );
        }
    }

    if queued.is_empty() {
        debug!("no addon updates pending");
        return Ok(());
    }

    info!(count = queued.len(), "addon auto update process");
    let results = join_all(queued.iter().map(|addon| async move {
        (addon.slug().to_string(), addon.update().await)
    }))
    .await;

    for (slug, result) in results {
        match result {
            Ok(()) => info!(addon = %slug, "addon updated"),
            Err(e) => warn!(addon = %slug, code = e.code(), "addon auto update failed: {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Reloadable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use warden_core::WardenError;

    struct MockAddon {
        slug: String,
        installed: bool,
        auto_update: bool,
        version: String,
        latest: String,
        schema_ok: bool,
        fails: bool,
        updates: AtomicU32,
    }

    impl MockAddon {
        fn eligible(slug: &str) -> Self {
            Self {
                slug: slug.to_string(),
                installed: true,
                auto_update: true,
                version: "1.0.0".to_string(),
                latest: "1.1.0".to_string(),
                schema_ok: true,
                fails: false,
                updates: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Addon for MockAddon {
        fn slug(&self) -> &str {
            &self.slug
        }
        fn is_installed(&self) -> bool {
            self.installed
        }
        fn auto_update(&self) -> bool {
            self.auto_update
        }
        fn version_installed(&self) -> Option<String> {
            self.installed.then(|| self.version.clone())
        }
        fn version_latest(&self) -> String {
            self.latest.clone()
        }
        fn passes_schema_check(&self) -> bool {
            self.schema_ok
        }
        async fn update(&self) -> Result<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(10)).await;
            if self.fails {
                return Err(WardenError::Addon {
                    slug: self.slug.clone(),
                    reason: "image pull failed".to_string(),
                });
            }
            Ok(())
        }
    }

    struct MockManager {
        addons: Vec<Arc<MockAddon>>,
    }

    #[async_trait]
    impl Reloadable for MockManager {
        fn name(&self) -> &str {
            "addons"
        }
        async fn reload(&self) -> Result<()> {
            Ok(())
        }
    }

    impl AddonManager for MockManager {
        fn list_addons(&self) -> Vec<Arc<dyn Addon>> {
            self.addons
                .iter()
                .map(|a| Arc::clone(a) as Arc<dyn Addon>)
                .collect()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn up_to_date_addon_is_never_updated() {
        let current = Arc::new(MockAddon {
            latest: "1.0.0".to_string(),
            ..MockAddon::eligible("core_ssh")
        });
        let manager = MockManager {
            addons: vec![Arc::clone(&current)],
        };

        for _ in 0..5 {
            update_addons(&manager).await.expect("job never fails");
        }
        assert_eq!(current.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_schema_blocks_update() {
        let broken = Arc::new(MockAddon {
            schema_ok: false,
            ..MockAddon::eligible("mosquitto")
        });
        let manager = MockManager {
            addons: vec![Arc::clone(&broken)],
        };

        for _ in 0..3 {
            update_addons(&manager).await.expect("job never fails");
        }
        assert_eq!(broken.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn skips_uninstalled_and_opted_out() {
        let uninstalled = Arc::new(MockAddon {
            installed: false,
            ..MockAddon::eligible("samba")
        });
        let opted_out = Arc::new(MockAddon {
            auto_update: false,
            ..MockAddon::eligible("duckdns")
        });
        let eligible = Arc::new(MockAddon::eligible("configurator"));
        let manager = MockManager {
            addons: vec![
                Arc::clone(&uninstalled),
                Arc::clone(&opted_out),
                Arc::clone(&eligible),
            ],
        };

        update_addons(&manager).await.expect("job never fails");
        assert_eq!(uninstalled.calls(), 0);
        assert_eq!(opted_out.calls(), 0);
        assert_eq!(eligible.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_abort_the_batch() {
        let first = Arc::new(MockAddon::eligible("a"));
        let failing = Arc::new(MockAddon {
            fails: true,
            ..MockAddon::eligible("b")
        });
        let third = Arc::new(MockAddon::eligible("c"));
        let manager = MockManager {
            addons: vec![Arc::clone(&first), Arc::clone(&failing), Arc::clone(&third)],
        };

        update_addons(&manager)
            .await
            .expect("individual failures are not re-raised");
        assert_eq!(first.calls(), 1);
        assert_eq!(failing.calls(), 1);
        assert_eq!(third.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn updates_run_concurrently_and_are_awaited() {
        let addons: Vec<Arc<MockAddon>> = ["a", "b", "c"]
            .into_iter()
            .map(|slug| Arc::new(MockAddon::eligible(slug)))
            .collect();
        let manager = MockManager {
            addons: addons.clone(),
        };

        let started = tokio::time::Instant::now();
        update_addons(&manager).await.expect("job never fails");

        // Each update sleeps 10s; run serially this would take 30s.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(20));
        assert!(addons.iter().all(|a| a.calls() == 1));
    }
}
