use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};
use warden_core::config::TasksConfig;
use warden_scheduler::{JobHandle, Scheduler};

use crate::{
    addons::update_addons,
    error::Result,
    facade::{AddonManager, ManagedService, Reloadable, SelfUpdater},
    supervisor::update_supervisor,
    watchdog::{ApiWatchdog, DockerWatchdog},
};

/// Everything the jobs act on, injected once at construction.
pub struct Collaborators {
    pub addons: Arc<dyn AddonManager>,
    pub supervisor: Arc<dyn SelfUpdater>,
    pub updater: Arc<dyn Reloadable>,
    pub snapshots: Arc<dyn Reloadable>,
    pub host: Arc<dyn Reloadable>,
    pub service: Arc<dyn ManagedService>,
}

/// Owns the periodic maintenance and watchdog jobs.
///
/// Built by the host from `WardenConfig::tasks` (see `warden_core`), a
/// shared [`Scheduler`] and the concrete collaborators, then started with
/// [`Tasks::load`].
pub struct Tasks {
    scheduler: Scheduler,
    deps: Collaborators,
    config: TasksConfig,
    jobs: HashSet<JobHandle>,
}

impl Tasks {
    pub fn new(scheduler: Scheduler, deps: Collaborators, config: TasksConfig) -> Self {
        Self {
            scheduler,
            deps,
            config,
            jobs: HashSet::new(),
        }
    }

    /// Register every job with the scheduler.
    ///
    /// Calling it again after a successful load is a no-op. If any
    /// registration fails, the jobs registered so far are removed and the
    /// error is returned.
    pub fn load(&mut self) -> Result<()> {
        if !self.jobs.is_empty() {
            debug!(jobs = self.jobs.len(), "tasks already loaded");
            return Ok(());
        }

        if let Err(e) = self.register_all() {
            self.unload();
            return Err(e);
        }

        info!(jobs = self.jobs.len(), "all core tasks are scheduled");
        Ok(())
    }

    /// Remove every registered job from the scheduler.
    pub fn unload(&mut self) {
        for handle in self.jobs.drain() {
            if let Err(e) = self.scheduler.remove(&handle) {
                warn!(job_id = %handle, "failed to remove job: {e}");
            }
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    fn register_all(&mut self) -> Result<()> {
        self.config.validate()?;
        let cfg = self.config.clone();

        let addons = Arc::clone(&self.deps.addons);
        self.register("update_addons", cfg.update_addons_secs, move || {
            let addons = Arc::clone(&addons);
            async move { update_addons(addons.as_ref()).await }
        })?;

        let supervisor = Arc::clone(&self.deps.supervisor);
        self.register("update_supervisor", cfg.update_supervisor_secs, move || {
            let supervisor = Arc::clone(&supervisor);
            async move { update_supervisor(supervisor.as_ref()).await }
        })?;

        self.register_reload(cfg.reload_addons_secs, Arc::clone(&self.deps.addons))?;
        self.register_reload(cfg.reload_updater_secs, Arc::clone(&self.deps.updater))?;
        self.register_reload(cfg.reload_snapshots_secs, Arc::clone(&self.deps.snapshots))?;
        self.register_reload(cfg.reload_host_secs, Arc::clone(&self.deps.host))?;

        let docker = Arc::new(DockerWatchdog::new(Arc::clone(&self.deps.service)));
        self.register("watchdog_docker", cfg.watchdog_docker_secs, move || {
            let docker = Arc::clone(&docker);
            async move { docker.check().await }
        })?;

        // The miss counter lives inside this watchdog and nowhere else.
        let api = Arc::new(ApiWatchdog::new(Arc::clone(&self.deps.service)));
        self.register("watchdog_api", cfg.watchdog_api_secs, move || {
            let api = Arc::clone(&api);
            async move { api.check().await }
        })?;

        Ok(())
    }

    /// Job is named `reload_<target name>`.
    fn register_reload<R>(&mut self, interval_secs: u64, target: Arc<R>) -> Result<()>
    where
        R: Reloadable + ?Sized + 'static,
    {
        let name = format!("reload_{}", target.name());
        self.register(&name, interval_secs, move || {
            let target = Arc::clone(&target);
            async move {
                debug!(subsystem = target.name(), "reloading");
                target.reload().await
            }
        })
    }

    fn register<F, Fut>(&mut self, name: &str, interval_secs: u64, callback: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = warden_core::Result<()>> + Send + 'static,
    {
        let handle = self.scheduler.register_task(name, interval_secs, callback)?;
        self.jobs.insert(handle);
        Ok(())
    }
}
