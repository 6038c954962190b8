// src/watch/directories.rs

//! Keeps the set of subscribed directories in step with the live tree.
//!
//! The invariant maintained here: every directory under the root that is not
//! classified `Exclude` (and not below an excluded directory) is subscribed
//! exactly once, and nothing else is.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::types::Classification;
use crate::watch::patterns::RuleEngine;
use crate::watch::source::{SubscriptionHandle, WatchSource};

/// A live subscription.
#[derive(Debug, Clone)]
struct WatchedDirectory {
    handle: SubscriptionHandle,
    /// Canonical form, used to break symlink cycles across walks.
    canonical: PathBuf,
}

/// Owns the watch source's subscriptions.
#[derive(Debug)]
pub struct DirectoryWatcher<S: WatchSource> {
    source: S,
    rules: Arc<RuleEngine>,
    fs: Arc<dyn FileSystem>,
    watched: HashMap<PathBuf, WatchedDirectory>,
}

impl<S: WatchSource> DirectoryWatcher<S> {
    pub fn new(source: S, rules: Arc<RuleEngine>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            source,
            rules,
            fs,
            watched: HashMap::new(),
        }
    }

    /// Walk the whole tree from the rule engine's root.
    pub fn start(&mut self) -> usize {
        let root = self.rules.root().to_path_buf();
        let added = self.subscribe_tree(&root);
        info!(root = ?root, directories = self.watched.len(), "initial directory walk finished");
        added
    }

    /// Subscribe `start` and every non-excluded directory below it.
    ///
    /// Excluded directories are neither subscribed nor descended into.
    /// Directories reached twice (through symlinks) are only visited once.
    /// Failures are logged and only cost the affected subtree.
    ///
    /// Returns the number of new subscriptions.
    pub fn subscribe_tree(&mut self, start: &Path) -> usize {
        let mut visited: HashSet<PathBuf> = self
            .watched
            .values()
            .map(|w| w.canonical.clone())
            .collect();
        let mut added = 0;
        let mut stack = vec![start.to_path_buf()];

        while let Some(dir) = stack.pop() {
            if self.rules.classify(&dir) == Classification::Exclude {
                debug!(path = ?dir, "excluded directory; skipping subtree");
                continue;
            }
            if self.watched.contains_key(&dir) {
                continue;
            }

            let canonical = match self.fs.canonicalize(&dir) {
                Ok(c) => c,
                Err(err) => {
                    warn!(path = ?dir, error = %err, "cannot resolve directory; skipping");
                    continue;
                }
            };
            if !visited.insert(canonical.clone()) {
                debug!(path = ?dir, canonical = ?canonical, "directory already visited; not following");
                continue;
            }

            let handle = match self.source.subscribe(&dir) {
                Ok(h) => h,
                Err(err) => {
                    warn!(path = ?dir, error = %err, "cannot subscribe directory; skipping subtree");
                    continue;
                }
            };
            debug!(path = ?dir, "subscribed directory");
            self.watched
                .insert(dir.clone(), WatchedDirectory { handle, canonical });
            added += 1;

            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = ?dir, error = %err, "cannot list directory; children not walked");
                    continue;
                }
            };
            for entry in entries {
                if self.fs.is_dir(&entry) {
                    stack.push(entry);
                }
            }
        }

        added
    }

    /// Walk `start` afresh, releasing any subscriptions already held at or
    /// below it first.
    ///
    /// A directory that appears at an already watched path replaced the old
    /// one, whose watches point at a directory that is gone.
    ///
    /// Returns the number of subscriptions made.
    pub fn resubscribe_tree(&mut self, start: &Path) -> usize {
        let released = self.unsubscribe(start);
        if released > 0 {
            debug!(path = ?start, released, "directory replaced; renewing subscriptions");
        }
        self.subscribe_tree(start)
    }

    /// Drop the subscription for `dir` and for every subscribed directory
    /// below it. A no-op for paths that were never subscribed.
    ///
    /// Returns the number of subscriptions released.
    pub fn unsubscribe(&mut self, dir: &Path) -> usize {
        let doomed: Vec<PathBuf> = self
            .watched
            .keys()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();

        for path in &doomed {
            self.release(path);
        }
        doomed.len()
    }

    /// Release every subscription. Used on shutdown.
    pub fn unsubscribe_all(&mut self) {
        let all: Vec<PathBuf> = self.watched.keys().cloned().collect();
        for path in &all {
            self.release(path);
        }
        info!(released = all.len(), "all directory subscriptions released");
    }

    fn release(&mut self, path: &Path) {
        let Some(entry) = self.watched.remove(path) else {
            return;
        };
        // The backend may already have dropped the watch when the directory
        // vanished; that is not worth more than a debug line.
        match self.source.unsubscribe(path) {
            Ok(()) => debug!(path = ?path, handle = entry.handle.0, "unsubscribed directory"),
            Err(err) => debug!(path = ?path, error = %err, "unsubscribe reported an error"),
        }
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains_key(dir)
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Subscribed directories, sorted.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.watched.keys().cloned().collect();
        dirs.sort();
        dirs
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
