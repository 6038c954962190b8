// src/exec/backend.rs

//! Pluggable process spawner.
//!
//! The scheduler talks to a `ProcessSpawner` instead of
//! `tokio::process::Command` directly, so tests can swap in a fake that
//! records argv and completes on demand.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::errors::{ExecOnchangesError, Result};

/// How a spawned process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    /// Non-zero exit; `-1` when there is no code (killed by a signal).
    Failed(i32),
}

/// Future resolving once the process has terminated.
pub type Completion = Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + 'static>>;

/// Trait abstracting how a single command is launched.
pub trait ProcessSpawner: Send + Sync + 'static {
    /// Launch `argv` and return its completion.
    ///
    /// The process must be started by the time this returns, so it runs
    /// even if the completion is never polled.
    ///
    /// Spawn failures surface as an `Err` from the completion, so the caller
    /// handles both kinds of failure in one place.
    fn spawn(&self, argv: Vec<String>) -> Completion;
}

/// Real spawner used in production.
///
/// Children inherit stdout/stderr and are not killed when their completion
/// future is dropped: commands outlive the watcher on shutdown.
#[derive(Debug, Clone, Default)]
pub struct RealProcessSpawner;

impl ProcessSpawner for RealProcessSpawner {
    /// The child is started before this returns; only waiting for it is
    /// deferred to the completion.
    fn spawn(&self, argv: Vec<String>) -> Completion {
        let mut child = match start(&argv) {
            Ok(child) => child,
            Err(err) => return Box::pin(async move { Err(err) }),
        };

        Box::pin(async move {
            let status = child.wait().await?;
            if status.success() {
                Ok(ProcessOutcome::Success)
            } else {
                Ok(ProcessOutcome::Failed(status.code().unwrap_or(-1)))
            }
        })
    }
}

fn start(argv: &[String]) -> Result<Child> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| ExecOnchangesError::SpawnError("empty command".to_string()))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(false);

    info!(command = ?argv, "execute command");

    cmd.spawn()
        .map_err(|e| ExecOnchangesError::SpawnError(format!("spawning {program:?}: {e}")))
}
