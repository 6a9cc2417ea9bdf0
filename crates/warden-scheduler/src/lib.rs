//! `warden-scheduler` — in-process recurring task engine on Tokio.
//!
//! # Overview
//!
//! Each registered job gets its own Tokio task that sleeps for the job's
//! interval, runs the callback to completion, records the outcome and goes
//! back to sleep. A job never overlaps with itself; different jobs run
//! independently of one another.
//!
//! | Operation        | Behaviour                                          |
//! |------------------|----------------------------------------------------|
//! | `register_task`  | Start a repeating job, first run after one interval |
//! | `remove`         | Abort a job's loop                                 |
//! | `list_jobs`      | Snapshot of every live job                         |
//! | `shutdown`       | Stop every loop at its next suspension point       |

pub mod engine;
pub mod error;
pub mod types;

pub use engine::Scheduler;
pub use error::{Result, SchedulerError};
pub use types::{JobCallback, JobFuture, JobHandle, JobSnapshot, JobStatus};
