use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use exec_onchanges::errors::{ExecOnchangesError, Result};
use exec_onchanges::watch::{SubscriptionHandle, WatchSource};

/// One call made against a [`FakeWatchSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Subscribe(PathBuf),
    Unsubscribe(PathBuf),
}

/// A watch source that only records what it was asked to do.
///
/// Clones share the same log, so a test can keep one clone while the
/// pipeline owns another. Events are injected separately through the
/// pipeline's event channel.
#[derive(Debug, Clone, Default)]
pub struct FakeWatchSource {
    calls: Arc<Mutex<Vec<SourceCall>>>,
    refused: Arc<Mutex<HashSet<PathBuf>>>,
    next_id: Arc<AtomicU64>,
}

impl FakeWatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `subscribe(path)` fail.
    pub fn refuse(&self, path: impl Into<PathBuf>) {
        self.refused.lock().unwrap().insert(path.into());
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn subscribe_calls(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SourceCall::Subscribe(p) => Some(p),
                SourceCall::Unsubscribe(_) => None,
            })
            .collect()
    }

    pub fn unsubscribe_calls(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SourceCall::Unsubscribe(p) => Some(p),
                SourceCall::Subscribe(_) => None,
            })
            .collect()
    }

    /// Directories subscribed and not yet unsubscribed, replaying the log.
    pub fn active(&self) -> BTreeSet<PathBuf> {
        let mut active = BTreeSet::new();
        for call in self.calls() {
            match call {
                SourceCall::Subscribe(p) => {
                    active.insert(p);
                }
                SourceCall::Unsubscribe(p) => {
                    active.remove(&p);
                }
            }
        }
        active
    }
}

impl WatchSource for FakeWatchSource {
    fn subscribe(&mut self, dir: &Path) -> Result<SubscriptionHandle> {
        if self.refused.lock().unwrap().contains(dir) {
            return Err(ExecOnchangesError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("refused to watch {}", dir.display()),
            )));
        }
        self.calls
            .lock()
            .unwrap()
            .push(SourceCall::Subscribe(dir.to_path_buf()));
        Ok(SubscriptionHandle(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn unsubscribe(&mut self, dir: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(SourceCall::Unsubscribe(dir.to_path_buf()));
        Ok(())
    }
}
