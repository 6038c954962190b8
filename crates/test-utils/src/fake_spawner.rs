use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use exec_onchanges::exec::{Completion, ProcessOutcome, ProcessSpawner};

/// A process spawner that records argv instead of running anything.
///
/// - `FakeSpawner::new()` completes every process immediately.
/// - `FakeSpawner::held()` keeps every process "running" until
///   [`FakeSpawner::release`] is called.
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct FakeSpawner {
    spawned: Arc<Mutex<Vec<Vec<String>>>>,
    count: Arc<watch::Sender<usize>>,
    gate: Arc<watch::Sender<bool>>,
    outcome: ProcessOutcome,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::with_gate(true)
    }

    pub fn held() -> Self {
        Self::with_gate(false)
    }

    fn with_gate(open: bool) -> Self {
        Self {
            spawned: Arc::new(Mutex::new(Vec::new())),
            count: Arc::new(watch::Sender::new(0)),
            gate: Arc::new(watch::Sender::new(open)),
            outcome: ProcessOutcome::Success,
        }
    }

    /// Report `outcome` for every process instead of success.
    pub fn with_outcome(mut self, outcome: ProcessOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Let every held process (current and future) finish.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// argv of every spawn so far, in order.
    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.spawned.lock().unwrap().clone()
    }

    /// The path argument (last argv element) of every spawn so far.
    pub fn spawned_paths(&self) -> Vec<String> {
        self.spawned()
            .into_iter()
            .filter_map(|argv| argv.last().cloned())
            .collect()
    }

    /// Resolve once at least `n` processes have been spawned.
    pub async fn wait_for_spawns(&self, n: usize) {
        let mut rx = self.count.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

impl Default for FakeSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self, argv: Vec<String>) -> Completion {
        self.spawned.lock().unwrap().push(argv);
        self.count.send_modify(|c| *c += 1);

        let mut gate = self.gate.subscribe();
        let outcome = self.outcome;
        Box::pin(async move {
            let _ = gate.wait_for(|open| *open).await;
            Ok(outcome)
        })
    }
}
