use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    error::{Result, SchedulerError},
    types::{JobCallback, JobFuture, JobHandle, JobSnapshot, JobStatus},
};

struct JobSlot {
    snapshot: JobSnapshot,
    task: Option<AbortHandle>,
}

struct Shared {
    jobs: DashMap<Uuid, JobSlot>,
    shutdown_tx: watch::Sender<bool>,
}

impl Shared {
    fn with_slot(&self, id: Uuid, f: impl FnOnce(&mut JobSlot)) {
        if let Some(mut slot) = self.jobs.get_mut(&id) {
            f(&mut slot);
        }
    }
}

/// Recurring task engine.
///
/// Cloning is cheap; all clones drive the same set of jobs. Dropping the last
/// clone stops every job loop, just like [`Scheduler::shutdown`].
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                jobs: DashMap::new(),
                shutdown_tx,
            }),
        }
    }

    /// Register `callback` to run every `interval_secs` seconds.
    ///
    /// The first run happens one interval after registration. The next
    /// interval only starts once the callback has completed, so a slow run
    /// delays its own job and nothing else.
    pub fn register_task<F, Fut>(
        &self,
        name: &str,
        interval_secs: u64,
        callback: F,
    ) -> Result<JobHandle>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = warden_core::Result<()>> + Send + 'static,
    {
        let callback: JobCallback = Arc::new(move || Box::pin(callback()) as JobFuture);
        self.register_callback(name, interval_secs, callback)
    }

    /// Same as [`Scheduler::register_task`] for an already boxed callback.
    pub fn register_callback(
        &self,
        name: &str,
        interval_secs: u64,
        callback: JobCallback,
    ) -> Result<JobHandle> {
        if interval_secs == 0 {
            return Err(SchedulerError::InvalidSchedule(format!(
                "job {name}: interval must be at least one second"
            )));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SchedulerError::NoRuntime {
                name: name.to_string(),
            }
        })?;

        let shutdown = self.shared.shutdown_tx.subscribe();
        if *shutdown.borrow() {
            return Err(SchedulerError::Stopped);
        }

        let id = Uuid::new_v4();
        self.shared.jobs.insert(
            id,
            JobSlot {
                snapshot: JobSnapshot {
                    id,
                    name: name.to_string(),
                    interval_secs,
                    status: JobStatus::Pending,
                    run_count: 0,
                    last_run: None,
                    last_error: None,
                },
                task: None,
            },
        );

        let task = runtime.spawn(run_job(
            Arc::downgrade(&self.shared),
            id,
            name.to_string(),
            Duration::from_secs(interval_secs),
            callback,
            shutdown,
        ));
        self.shared
            .with_slot(id, |slot| slot.task = Some(task.abort_handle()));

        info!(job_id = %id, job = %name, interval_secs, "job registered");
        Ok(JobHandle(id))
    }

    /// Stop a job and forget it. Returns `JobNotFound` for unknown handles.
    pub fn remove(&self, handle: &JobHandle) -> Result<()> {
        let (_, slot) =
            self.shared
                .jobs
                .remove(&handle.0)
                .ok_or_else(|| SchedulerError::JobNotFound {
                    id: handle.to_string(),
                })?;
        if let Some(task) = slot.task {
            task.abort();
        }
        info!(job_id = %handle, job = %slot.snapshot.name, "job removed");
        Ok(())
    }

    /// Snapshot of every registered job, ordered by name.
    pub fn list_jobs(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<JobSnapshot> = self
            .shared
            .jobs
            .iter()
            .map(|entry| entry.value().snapshot.clone())
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        jobs
    }

    pub fn len(&self) -> usize {
        self.shared.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.jobs.is_empty()
    }

    pub fn is_stopped(&self) -> bool {
        *self.shared.shutdown_tx.borrow()
    }

    /// Signal every job loop to exit and refuse further registrations.
    ///
    /// A callback that is already running finishes first.
    pub fn shutdown(&self) {
        self.shared.shutdown_tx.send_replace(true);
        self.shared.jobs.clear();
        info!("scheduler shutting down");
    }
}

async fn run_job(
    shared: Weak<Shared>,
    id: Uuid,
    name: String,
    period: Duration,
    callback: JobCallback,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let Some(state) = shared.upgrade() else { break };
        state.with_slot(id, |slot| {
            slot.snapshot.status = JobStatus::Running;
            slot.snapshot.last_run = Some(Utc::now());
        });
        drop(state);

        debug!(job_id = %id, job = %name, "running job");
        let outcome = callback().await;

        let Some(state) = shared.upgrade() else { break };
        state.with_slot(id, |slot| {
            slot.snapshot.run_count += 1;
            match &outcome {
                Ok(()) => slot.snapshot.status = JobStatus::Pending,
                Err(e) => {
                    slot.snapshot.status = JobStatus::Failed;
                    slot.snapshot.last_error = Some(e.to_string());
                }
            }
        });

        if let Err(e) = outcome {
            error!(job_id = %id, job = %name, code = e.code(), "job failed: {e}");
        }
    }
    debug!(job_id = %id, job = %name, "job loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use warden_core::WardenError;

    fn counting_job(scheduler: &Scheduler, interval: u64) -> (JobHandle, Arc<AtomicU32>) {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        let handle = scheduler
            .register_task("counter", interval, move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .expect("registration succeeds");
        (handle, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_once_per_interval() {
        let scheduler = Scheduler::new();
        let (_handle, runs) = counting_job(&scheduler, 10);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0, "first run waits one interval");

        tokio::time::sleep(Duration::from_secs(26)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        let jobs = scheduler.list_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].run_count, 3);
        assert_eq!(jobs[0].status, JobStatus::Pending);
        assert!(jobs[0].last_run.is_some());
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .register_task("bad", 0, || async { Ok(()) })
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidSchedule(_)));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn registration_outside_runtime_fails() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .register_task("orphan", 5, || async { Ok(()) })
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoRuntime { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_keeps_job_scheduled() {
        let scheduler = Scheduler::new();
        scheduler
            .register_task("flaky", 10, || async {
                Err(WardenError::Internal("boom".to_string()))
            })
            .expect("registration succeeds");

        tokio::time::sleep(Duration::from_secs(25)).await;

        let job = &scheduler.list_jobs()[0];
        assert_eq!(job.run_count, 2);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.last_error.as_deref(), Some("Internal error: boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn removed_job_stops_running() {
        let scheduler = Scheduler::new();
        let (handle, runs) = counting_job(&scheduler, 10);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        scheduler.remove(&handle).expect("job exists");
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let err = scheduler.remove(&handle).unwrap_err();
        assert!(matches!(err, SchedulerError::JobNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_jobs_and_refuses_new_ones() {
        let scheduler = Scheduler::new();
        let (_handle, runs) = counting_job(&scheduler, 10);

        scheduler.shutdown();
        assert!(scheduler.is_stopped());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        let err = scheduler
            .register_task("late", 10, || async { Ok(()) })
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_job_never_overlaps_itself() {
        let scheduler = Scheduler::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(AtomicU32::new(0));

        let (a, p, s) = (Arc::clone(&active), Arc::clone(&peak), Arc::clone(&started));
        scheduler
            .register_task("slow", 10, move || {
                let (active, peak, started) = (Arc::clone(&a), Arc::clone(&p), Arc::clone(&s));
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(25)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .expect("registration succeeds");

        // Starts at t=10, 45, 80.
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn snapshot_serializes() {
        let scheduler = Scheduler::new();
        let (handle, _) = counting_job(&scheduler, 60);

        let json = serde_json::to_value(scheduler.list_jobs()).expect("serializable");
        assert_eq!(json[0]["name"], "counter");
        assert_eq!(json[0]["status"], "pending");
        assert_eq!(json[0]["interval_secs"], 60);
        assert_eq!(json[0]["id"], handle.to_string());
    }
}
