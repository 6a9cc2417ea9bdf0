//! `warden-tasks` — periodic maintenance and watchdog jobs for a supervised
//! service.
//!
//! [`Tasks::load`] registers every job with a [`warden_scheduler::Scheduler`];
//! after that the scheduler drives execution and the job bodies in this crate
//! only react to ticks.
//!
//! | Job                 | Default interval | Module            |
//! |---------------------|------------------|-------------------|
//! | `update_addons`     | 57600 s          | [`addons`]        |
//! | `update_supervisor` | 29100 s          | [`supervisor`]    |
//! | `reload_*` (×4)     | 21600 / 72000 s  | [`tasks`]         |
//! | `watchdog_docker`   | 15 s             | [`watchdog`]      |
//! | `watchdog_api`      | 300 s            | [`watchdog`]      |

pub mod addons;
pub mod error;
pub mod facade;
pub mod supervisor;
pub mod tasks;
pub mod watchdog;

pub use error::{Result, TasksError};
pub use facade::{Addon, AddonManager, ManagedService, Reloadable, SelfUpdater};
pub use tasks::{Collaborators, Tasks};
pub use watchdog::{ApiWatchdog, DockerWatchdog, WatchdogState};
