// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`template`] renders the configured argv for one changed path.
//! - [`backend`] provides the `ProcessSpawner` trait and the
//!   `tokio::process` implementation used in production, which tests replace
//!   with a fake.
//! - [`scheduler`] runs a batch only when nothing from the previous one is
//!   still running.

pub mod backend;
pub mod scheduler;
pub mod template;

pub use backend::{Completion, ProcessOutcome, ProcessSpawner, RealProcessSpawner};
pub use scheduler::{DispatchOutcome, ExecutionScheduler, RunningProcessCounter};
pub use template::{CommandTemplate, DEFAULT_PLACEHOLDER};
