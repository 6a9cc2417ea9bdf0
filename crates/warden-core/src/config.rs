use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, WardenError};

// Task cadence policy, in seconds.
pub const RUN_UPDATE_SUPERVISOR: u64 = 29_100;
pub const RUN_UPDATE_ADDONS: u64 = 57_600;
pub const RUN_RELOAD_ADDONS: u64 = 21_600;
pub const RUN_RELOAD_SNAPSHOTS: u64 = 72_000;
pub const RUN_RELOAD_HOST: u64 = 72_000;
pub const RUN_RELOAD_UPDATER: u64 = 21_600;
pub const RUN_WATCHDOG_SERVICE_DOCKER: u64 = 15;
pub const RUN_WATCHDOG_SERVICE_API: u64 = 300;

pub const DEFAULT_LOG_FILTER: &str = "warden_tasks=info,warden_scheduler=info";

/// Top-level config (warden.toml + WARDEN_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Interval of every periodic job, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_update_addons")]
    pub update_addons_secs: u64,
    #[serde(default = "default_update_supervisor")]
    pub update_supervisor_secs: u64,
    #[serde(default = "default_reload_addons")]
    pub reload_addons_secs: u64,
    #[serde(default = "default_reload_updater")]
    pub reload_updater_secs: u64,
    #[serde(default = "default_reload_snapshots")]
    pub reload_snapshots_secs: u64,
    #[serde(default = "default_reload_host")]
    pub reload_host_secs: u64,
    #[serde(default = "default_watchdog_docker")]
    pub watchdog_docker_secs: u64,
    #[serde(default = "default_watchdog_api")]
    pub watchdog_api_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            update_addons_secs: RUN_UPDATE_ADDONS,
            update_supervisor_secs: RUN_UPDATE_SUPERVISOR,
            reload_addons_secs: RUN_RELOAD_ADDONS,
            reload_updater_secs: RUN_RELOAD_UPDATER,
            reload_snapshots_secs: RUN_RELOAD_SNAPSHOTS,
            reload_host_secs: RUN_RELOAD_HOST,
            watchdog_docker_secs: RUN_WATCHDOG_SERVICE_DOCKER,
            watchdog_api_secs: RUN_WATCHDOG_SERVICE_API,
        }
    }
}

impl TasksConfig {
    /// Reject intervals the scheduler cannot honour.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("update_addons_secs", self.update_addons_secs),
            ("update_supervisor_secs", self.update_supervisor_secs),
            ("reload_addons_secs", self.reload_addons_secs),
            ("reload_updater_secs", self.reload_updater_secs),
            ("reload_snapshots_secs", self.reload_snapshots_secs),
            ("reload_host_secs", self.reload_host_secs),
            ("watchdog_docker_secs", self.watchdog_docker_secs),
            ("watchdog_api_secs", self.watchdog_api_secs),
        ];
        match fields.iter().find(|(_, secs)| *secs == 0) {
            Some((name, _)) => Err(WardenError::Config(format!(
                "tasks.{name} must be a positive number of seconds"
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Fallback `EnvFilter` directive when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_update_addons() -> u64 {
    RUN_UPDATE_ADDONS
}
fn default_update_supervisor() -> u64 {
    RUN_UPDATE_SUPERVISOR
}
fn default_reload_addons() -> u64 {
    RUN_RELOAD_ADDONS
}
fn default_reload_updater() -> u64 {
    RUN_RELOAD_UPDATER
}
fn default_reload_snapshots() -> u64 {
    RUN_RELOAD_SNAPSHOTS
}
fn default_reload_host() -> u64 {
    RUN_RELOAD_HOST
}
fn default_watchdog_docker() -> u64 {
    RUN_WATCHDOG_SERVICE_DOCKER
}
fn default_watchdog_api() -> u64 {
    RUN_WATCHDOG_SERVICE_API
}
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.warden/warden.toml", home)
}

impl WardenConfig {
    /// Load config from a TOML file with WARDEN_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `WARDEN_TASKS__WATCHDOG_API_SECS=120`. A missing file yields defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        if std::path::Path::new(&path).exists() {
            info!(path = %path, "loading config");
        } else {
            info!(path = %path, "config file not found, using defaults and WARDEN_* env");
        }

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("WARDEN_").split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: WardenConfig = figment
            .extract()
            .map_err(|e| WardenError::Config(e.to_string()))?;
        config.tasks.validate()?;
        Ok(config)
    }
}
