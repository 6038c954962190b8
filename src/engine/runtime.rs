// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::exec::{
    CommandTemplate, DispatchOutcome, ExecutionScheduler, ProcessSpawner, RunningProcessCounter,
};
use crate::fs::FileSystem;
use crate::watch::{EventRouter, RuleEngine, WatchEvent, WatchSource};

use super::debounce::{ChangeBatch, Debouncer};

/// The single consumer of raw watch events.
///
/// Routing, debouncing and dispatch all happen on this one task, so events
/// are handled strictly in delivery order. The loop waits on whichever comes
/// first: the next raw event, the debounce deadline, or shutdown.
pub struct Pipeline<S: WatchSource, P: ProcessSpawner> {
    router: EventRouter<S>,
    debouncer: Debouncer,
    scheduler: ExecutionScheduler<P>,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    batch_tx: Option<mpsc::Sender<ChangeBatch>>,
}

impl<S: WatchSource, P: ProcessSpawner> fmt::Debug for Pipeline<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("router", &self.router)
            .field("debouncer", &self.debouncer)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl<S: WatchSource, P: ProcessSpawner> Pipeline<S, P> {
    pub fn new(
        router: EventRouter<S>,
        debouncer: Debouncer,
        scheduler: ExecutionScheduler<P>,
        event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    ) -> Self {
        Self {
            router,
            debouncer,
            scheduler,
            event_rx,
            batch_tx: None,
        }
    }

    /// Wire every component from a validated config.
    ///
    /// Fails only if a glob pattern does not compile.
    pub fn from_config(
        cfg: &PipelineConfig,
        source: S,
        event_rx: mpsc::UnboundedReceiver<WatchEvent>,
        spawner: P,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let rules = RuleEngine::new(cfg.root.clone(), &cfg.includes, &cfg.excludes, cfg.precedence)?;
        if rules.rules().include.is_empty() {
            warn!("no include rules configured; no command will ever run");
        }

        let router = EventRouter::new(source, Arc::new(rules), fs);
        let debouncer = Debouncer::new(cfg.debounce);
        let template = CommandTemplate::new(cfg.command.clone(), cfg.placeholder.clone());
        let scheduler = ExecutionScheduler::new(template, RunningProcessCounter::new(), spawner);

        Ok(Self::new(router, debouncer, scheduler, event_rx))
    }

    /// Also publish every emitted batch on `tx`.
    ///
    /// Publishing never blocks the loop: if the receiver's buffer is full the
    /// notification is dropped with a warning.
    pub fn with_batch_notifier(mut self, tx: mpsc::Sender<ChangeBatch>) -> Self {
        self.batch_tx = Some(tx);
        self
    }

    pub fn counter(&self) -> RunningProcessCounter {
        self.scheduler.counter().clone()
    }

    /// Run on a background task and return a handle to stop it.
    pub fn spawn(self) -> PipelineHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(self.run(shutdown_rx));
        PipelineHandle {
            shutdown: Some(shutdown_tx),
            join,
        }
    }

    /// Main event loop.
    ///
    /// - Walks the tree and subscribes directories.
    /// - Routes raw events and feeds actionable paths to the debouncer.
    /// - Flushes due batches to the scheduler.
    /// - On shutdown (or when the event stream closes) releases every
    ///   subscription before returning.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        info!("exec-onchanges pipeline started");
        self.router.start();

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested; stopping pipeline");
                    break;
                }
                maybe_event = self.event_rx.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("watch event stream closed; exiting");
                            break;
                        }
                    }
                }
                _ = sleep_until_deadline(deadline) => {
                    self.flush_due();
                }
            }
        }

        self.router.release();
        info!("pipeline exiting");
        Ok(())
    }

    fn handle_event(&mut self, event: WatchEvent) {
        debug!(?event, "pipeline received event");
        // A lagging loop can see the event before the expired timer; the old
        // batch must be closed before this path is counted.
        self.flush_due();
        if let Some(path) = self.router.route(event) {
            self.debouncer.push(path, Instant::now());
        }
    }

    fn flush_due(&mut self) {
        let Some(batch) = self.debouncer.take_due(Instant::now()) else {
            return;
        };

        info!(
            paths = ?batch.paths().collect::<Vec<_>>(),
            "debounce window elapsed; emitting batch"
        );

        self.publish(&batch);

        match self.scheduler.dispatch(&batch) {
            DispatchOutcome::Dispatched(n) => debug!(processes = n, "batch dispatched"),
            DispatchOutcome::Skipped { running } => debug!(running, "batch skipped"),
        }
    }

    fn publish(&mut self, batch: &ChangeBatch) {
        let Some(tx) = &self.batch_tx else {
            return;
        };
        match tx.try_send(batch.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("batch receiver is lagging; notification dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("batch receiver closed; no longer publishing");
                self.batch_tx = None;
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle to a pipeline running on a background task.
///
/// Dropping the handle also stops the pipeline.
#[derive(Debug)]
pub struct PipelineHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<Result<()>>,
}

impl PipelineHandle {
    /// Stop the loop and wait for it to exit.
    ///
    /// Once this returns no further batch will be emitted and every
    /// subscription has been released. Commands that are already running
    /// are left to finish on their own.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            // The loop may already have exited on its own.
            let _ = tx.send(());
        }
        self.join
            .await
            .map_err(|e| anyhow!("pipeline task failed: {e}"))?
    }
}
