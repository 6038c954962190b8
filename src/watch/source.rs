// src/watch/source.rs

//! The watch primitive: per-directory subscriptions plus a stream of raw
//! change events.
//!
//! [`NotifyWatchSource`] is the production implementation on top of
//! `notify`. Every directory is subscribed **non-recursively**, so the
//! subscription set is exactly what [`DirectoryWatcher`] decides it should
//! be and excluded subtrees never generate events.
//!
//! [`DirectoryWatcher`]: crate::watch::directories::DirectoryWatcher

use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::errors::Result;

/// Kind of change reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchOp {
    Create,
    Write,
    Remove,
    Rename,
}

/// One raw change event, as delivered by the watch source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub op: WatchOp,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, op: WatchOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }

    /// Translate one `notify` event into zero or more `WatchEvent`s.
    ///
    /// A rename carrying both ends becomes a `Rename` of the old path plus a
    /// `Create` of the new one, so a directory moved into the tree is walked
    /// like a freshly created one.
    pub fn from_notify(event: Event) -> Vec<WatchEvent> {
        let op = match event.kind {
            EventKind::Create(_) => WatchOp::Create,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => WatchOp::Create,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
                let mut paths = event.paths.into_iter();
                let mut out = Vec::with_capacity(2);
                if let Some(from) = paths.next() {
                    out.push(WatchEvent::new(from, WatchOp::Rename));
                }
                if let Some(to) = paths.next() {
                    out.push(WatchEvent::new(to, WatchOp::Create));
                }
                return out;
            }
            EventKind::Modify(ModifyKind::Name(_)) => WatchOp::Rename,
            EventKind::Modify(_) | EventKind::Any => WatchOp::Write,
            EventKind::Remove(_) => WatchOp::Remove,
            EventKind::Access(_) | EventKind::Other => return Vec::new(),
        };

        event
            .paths
            .into_iter()
            .map(|path| WatchEvent::new(path, op))
            .collect()
    }
}

/// Opaque token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Subscribe / unsubscribe half of the watch primitive.
///
/// The event half is the `mpsc` receiver handed out alongside the source.
pub trait WatchSource: Send + 'static {
    /// Start receiving events for entries directly inside `dir`.
    fn subscribe(&mut self, dir: &Path) -> Result<SubscriptionHandle>;

    /// Stop receiving events for `dir`.
    fn unsubscribe(&mut self, dir: &Path) -> Result<()>;
}

/// `notify`-backed watch source.
///
/// Dropping it stops the backend thread and closes the event stream.
pub struct NotifyWatchSource {
    watcher: RecommendedWatcher,
    next_id: u64,
}

impl fmt::Debug for NotifyWatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyWatchSource")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl NotifyWatchSource {
    /// Create the backend and the receiving end of its event stream.
    ///
    /// The stream is unbounded: the backend thread that produces events also
    /// services `watch`/`unwatch` requests, so it must never block waiting
    /// on the consumer that is issuing those requests.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<WatchEvent>();

        // Closure called synchronously by notify whenever an event arrives.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    trace!(?event, "received notify event");
                    for ev in WatchEvent::from_notify(event) {
                        if event_tx.send(ev).is_err() {
                            debug!("event consumer gone; dropping notify event");
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "file watch error");
                }
            },
            Config::default(),
        )?;

        Ok((
            Self {
                watcher,
                next_id: 0,
            },
            event_rx,
        ))
    }
}

impl WatchSource for NotifyWatchSource {
    fn subscribe(&mut self, dir: &Path) -> Result<SubscriptionHandle> {
        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.next_id += 1;
        Ok(SubscriptionHandle(self.next_id))
    }

    fn unsubscribe(&mut self, dir: &Path) -> Result<()> {
        self.watcher.unwatch(dir)?;
        Ok(())
    }
}
