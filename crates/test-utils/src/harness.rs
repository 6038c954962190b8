use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use exec_onchanges::config::PipelineConfig;
use exec_onchanges::engine::{ChangeBatch, Pipeline, PipelineHandle};
use exec_onchanges::exec::RunningProcessCounter;
use exec_onchanges::fs::FileSystem;
use exec_onchanges::watch::{WatchEvent, WatchOp};

use crate::{FakeSpawner, FakeWatchSource};

/// A running pipeline wired to fakes, with every end exposed to the test.
///
/// Must be started from within a Tokio runtime.
pub struct PipelineHarness {
    pub source: FakeWatchSource,
    pub spawner: FakeSpawner,
    pub counter: RunningProcessCounter,
    pub batches: mpsc::Receiver<ChangeBatch>,
    events: mpsc::UnboundedSender<WatchEvent>,
    handle: Option<PipelineHandle>,
}

impl PipelineHarness {
    pub fn start(cfg: &PipelineConfig, fs: Arc<dyn FileSystem>, spawner: FakeSpawner) -> Self {
        Self::start_with_source(cfg, fs, FakeWatchSource::new(), spawner)
    }

    /// Like [`PipelineHarness::start`], with a source prepared by the test
    /// (e.g. with refused directories).
    pub fn start_with_source(
        cfg: &PipelineConfig,
        fs: Arc<dyn FileSystem>,
        source: FakeWatchSource,
        spawner: FakeSpawner,
    ) -> Self {
        let (events, event_rx) = mpsc::unbounded_channel();
        let (batch_tx, batches) = mpsc::channel(16);

        let pipeline = Pipeline::from_config(cfg, source.clone(), event_rx, spawner.clone(), fs)
            .expect("pipeline config should compile")
            .with_batch_notifier(batch_tx);
        let counter = pipeline.counter();
        let handle = pipeline.spawn();

        Self {
            source,
            spawner,
            counter,
            batches,
            events,
            handle: Some(handle),
        }
    }

    /// Inject a raw event as if the watch backend had delivered it.
    pub fn send(&self, path: impl Into<PathBuf>, op: WatchOp) {
        self.events
            .send(WatchEvent::new(path, op))
            .expect("pipeline stopped receiving events");
    }

    /// Next emitted batch.
    pub async fn next_batch(&mut self) -> ChangeBatch {
        self.batches.recv().await.expect("pipeline exited")
    }

    /// Stop the pipeline. Later calls are no-ops.
    pub async fn stop(&mut self) -> exec_onchanges::errors::Result<()> {
        match self.handle.take() {
            Some(handle) => handle.stop().await,
            None => Ok(()),
        }
    }
}
