//! `warden-core` — configuration, errors and small helpers shared by every
//! warden crate.
//!
//! A host process starts with these two calls, then hands
//! `config.tasks` to `warden_tasks::Tasks::new`:
//!
//! ```no_run
//! use warden_core::config::WardenConfig;
//!
//! let config = WardenConfig::load(None)?;
//! warden_core::telemetry::init(&config.log.filter);
//! # Ok::<(), warden_core::WardenError>(())
//! ```

pub mod config;
pub mod error;
pub mod telemetry;

pub use error::{Result, WardenError};
