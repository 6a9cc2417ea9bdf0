//! Liveness watchdogs for the managed service.
//!
//! Two independent signals are watched: process presence (acted on at the
//! first miss) and API responsiveness (acted on at the second consecutive
//! miss). Neither watchdog touches the service while it reports an
//! operation in progress.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, warn};
use warden_core::Result;

use crate::facade::ManagedService;

/// Key of the consecutive API miss counter.
pub const API_MISS_COUNT: &str = "api-miss-count";

/// Transient per-watchdog counters. An absent key reads as zero.
///
/// Lives only as long as the coordinator; nothing is persisted.
#[derive(Debug, Default)]
pub struct WatchdogState {
    counters: DashMap<&'static str, u32>,
}

impl WatchdogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &'static str) -> u32 {
        self.counters.get(key).map(|v| *v).unwrap_or(0)
    }

    /// Add one and return the new value.
    pub fn increment(&self, key: &'static str) -> u32 {
        let mut entry = self.counters.entry(key).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn reset(&self, key: &'static str) {
        self.counters.insert(key, 0);
    }
}

/// Starts the service when its process is gone.
pub struct DockerWatchdog {
    service: Arc<dyn ManagedService>,
}

impl DockerWatchdog {
    pub fn new(service: Arc<dyn ManagedService>) -> Self {
        Self { service }
    }

    pub async fn check(&self) -> Result<()> {
        let service = self.service.as_ref();
        if !service.is_initialized().await || !service.watchdog_enabled() {
            return Ok(());
        }

        if service.in_progress() || service.is_running().await {
            return Ok(());
        }

        warn!(service = service.name(), "watchdog found a problem with the service process");
        service.start().await
    }
}

/// Restarts the service after two consecutive unanswered API probes.
pub struct ApiWatchdog {
    service: Arc<dyn ManagedService>,
    state: WatchdogState,
}

impl ApiWatchdog {
    pub fn new(service: Arc<dyn ManagedService>) -> Self {
        Self {
            service,
            state: WatchdogState::new(),
        }
    }

    /// Consecutive misses recorded so far.
    pub fn miss_count(&self) -> u32 {
        self.state.get(API_MISS_COUNT)
    }

    pub async fn check(&self) -> Result<()> {
        let service = self.service.as_ref();
        if !service.is_initialized().await || !service.watchdog_enabled() {
            return Ok(());
        }

        // A successful probe leaves the counter untouched; it is only
        // cleared after a restart.
        if service.in_progress() || service.check_api_health().await {
            return Ok(());
        }

        let misses = self.state.increment(API_MISS_COUNT);
        if misses == 1 {
            warn!(service = service.name(), "watchdog missed an API response");
            return Ok(());
        }

        error!(service = service.name(), misses, "watchdog found a problem with the service API");
        let restarted = service.restart().await;
        self.state.reset(API_MISS_COUNT);
        debug!(service = service.name(), ok = restarted.is_ok(), "api miss counter reset");
        restarted
    }
}
