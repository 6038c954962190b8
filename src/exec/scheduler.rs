// src/exec/scheduler.rs

//! Serialised execution of change batches.
//!
//! A batch only runs when nothing from the previous batch is still running.
//! Otherwise the whole batch is dropped: editors fire many events per save,
//! and queueing them would build an unbounded backlog.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{error, info, warn};

use crate::engine::ChangeBatch;
use crate::exec::backend::{ProcessOutcome, ProcessSpawner};
use crate::exec::template::CommandTemplate;

/// Number of spawned processes that have not terminated yet.
///
/// Cloning shares the count. Only the scheduler increments it; each
/// increment is paired with exactly one decrement by a [`RunningGuard`].
#[derive(Debug, Clone, Default)]
pub struct RunningProcessCounter {
    running: Arc<AtomicUsize>,
}

impl RunningProcessCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> RunningGuard {
        self.running.fetch_add(1, Ordering::SeqCst);
        RunningGuard {
            running: Arc::clone(&self.running),
        }
    }
}

/// Decrements the counter when dropped, whatever way the process ended.
#[derive(Debug)]
struct RunningGuard {
    running: Arc<AtomicUsize>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// What happened to a batch handed to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// One process was started per path.
    Dispatched(usize),
    /// Processes from an earlier batch were still running.
    Skipped { running: usize },
}

pub struct ExecutionScheduler<P: ProcessSpawner> {
    template: CommandTemplate,
    counter: RunningProcessCounter,
    spawner: P,
}

impl<P: ProcessSpawner> std::fmt::Debug for ExecutionScheduler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionScheduler")
            .field("template", &self.template)
            .field("running", &self.counter.current())
            .finish_non_exhaustive()
    }
}

impl<P: ProcessSpawner> ExecutionScheduler<P> {
    pub fn new(template: CommandTemplate, counter: RunningProcessCounter, spawner: P) -> Self {
        Self {
            template,
            counter,
            spawner,
        }
    }

    pub fn counter(&self) -> &RunningProcessCounter {
        &self.counter
    }

    /// Start one process per path in `batch`, unless processes are still
    /// running, in which case the batch is discarded.
    ///
    /// Must be called from within a Tokio runtime; each process is awaited
    /// on its own task.
    pub fn dispatch(&self, batch: &ChangeBatch) -> DispatchOutcome {
        let running = self.counter.current();
        if running > 0 {
            info!(
                running,
                paths = ?batch.paths().collect::<Vec<_>>(),
                "file change detected, but skipped because a process is still running"
            );
            return DispatchOutcome::Skipped { running };
        }

        let mut started = 0;
        for path in batch.paths() {
            let argv = self.template.render(path);
            let guard = self.counter.acquire();
            let completion = self.spawner.spawn(argv.clone());

            tokio::spawn(async move {
                let _guard = guard;
                match completion.await {
                    Ok(ProcessOutcome::Success) => {
                        info!(command = ?argv, "process finished");
                    }
                    Ok(ProcessOutcome::Failed(code)) => {
                        warn!(command = ?argv, exit_code = code, "process exited with failure");
                    }
                    Err(err) => {
                        error!(command = ?argv, error = %err, "process error");
                    }
                }
            });
            started += 1;
        }

        DispatchOutcome::Dispatched(started)
    }
}
