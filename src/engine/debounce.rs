// src/engine/debounce.rs

//! Idle-timer debouncing of actionable paths.
//!
//! State machine:
//!
//! ```text
//! Idle --push--> Collecting --push (deadline reset)--> Collecting
//!                Collecting --deadline passed--> emit batch --> Idle
//! ```
//!
//! The debouncer never sleeps itself. The consumer loop asks for
//! [`Debouncer::deadline`], waits on it alongside the event queue, and then
//! calls [`Debouncer::take_due`] with the current time. Because `take_due`
//! re-checks against the *current* deadline, a timer that fired just before
//! a reset can never flush a burst that is still active.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Distinct paths collected during one debounce cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeBatch {
    paths: BTreeSet<PathBuf>,
}

impl ChangeBatch {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &std::path::Path) -> bool {
        self.paths.contains(path)
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for ChangeBatch {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A batch that is still collecting.
#[derive(Debug, Clone)]
struct PendingBatch {
    paths: BTreeSet<PathBuf>,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<PendingBatch>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.pending.is_some()
    }

    /// When the current batch will flush, if one is collecting.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Add a path and push the deadline out to `now + window`.
    pub fn push(&mut self, path: PathBuf, now: Instant) {
        let deadline = now + self.window;
        match &mut self.pending {
            Some(pending) => {
                pending.paths.insert(path);
                pending.deadline = deadline;
            }
            None => {
                let mut paths = BTreeSet::new();
                paths.insert(path);
                self.pending = Some(PendingBatch { paths, deadline });
            }
        }
        trace!(?deadline, "debounce deadline reset");
    }

    /// Emit the batch if its deadline has passed; otherwise leave it alone.
    pub fn take_due(&mut self, now: Instant) -> Option<ChangeBatch> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| now >= p.deadline);
        if !due {
            return None;
        }
        self.pending.take().map(|p| ChangeBatch { paths: p.paths })
    }
}
