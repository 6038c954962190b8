// src/watch/router.rs

//! Turns raw watch events into actionable changed paths.
//!
//! For every event, in delivery order:
//! 1. classify the path,
//! 2. keep the directory subscriptions up to date (created or moved-in
//!    directories are walked, removed ones are released whatever their
//!    classification),
//! 3. forward the path only if it is `Include` *and* actionable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::types::Classification;
use crate::watch::directories::DirectoryWatcher;
use crate::watch::patterns::RuleEngine;
use crate::watch::source::{WatchEvent, WatchOp, WatchSource};

pub struct EventRouter<S: WatchSource> {
    rules: Arc<RuleEngine>,
    directories: DirectoryWatcher<S>,
    fs: Arc<dyn FileSystem>,
}

impl<S: WatchSource> std::fmt::Debug for EventRouter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("watched", &self.directories.len())
            .finish_non_exhaustive()
    }
}

impl<S: WatchSource> EventRouter<S> {
    pub fn new(source: S, rules: Arc<RuleEngine>, fs: Arc<dyn FileSystem>) -> Self {
        let directories = DirectoryWatcher::new(source, Arc::clone(&rules), Arc::clone(&fs));
        Self {
            rules,
            directories,
            fs,
        }
    }

    /// Run the startup walk.
    pub fn start(&mut self) -> usize {
        self.directories.start()
    }

    /// Handle one raw event. Returns the path to hand to the debouncer, if
    /// any.
    pub fn route(&mut self, event: WatchEvent) -> Option<PathBuf> {
        let path = if event.path.is_absolute() {
            event.path
        } else {
            self.rules.root().join(&event.path)
        };

        let class = self.rules.classify(&path);
        trace!(path = ?path, op = ?event.op, ?class, "classified event");

        // Some backends report the destination of a move as a bare rename.
        if matches!(event.op, WatchOp::Create | WatchOp::Rename)
            && class != Classification::Exclude
            && self.fs.is_dir(&path)
        {
            let added = self.directories.resubscribe_tree(&path);
            debug!(path = ?path, added, "directory appeared; subscribed subtree");
        }

        if self.signals_removal(event.op, &path) {
            let released = self.directories.unsubscribe(&path);
            if released > 0 {
                debug!(path = ?path, released, "directory gone; released subscriptions");
            }
        }

        if class == Classification::Include && self.is_actionable(event.op, &path) {
            Some(path)
        } else {
            None
        }
    }

    /// A removal, or a rename away from a path that no longer exists.
    fn signals_removal(&self, op: WatchOp, path: &Path) -> bool {
        match op {
            WatchOp::Remove => true,
            WatchOp::Rename => !self.fs.exists(path),
            WatchOp::Create | WatchOp::Write => false,
        }
    }

    /// Not a removal, and the path is still there as a non-directory.
    pub fn is_actionable(&self, op: WatchOp, path: &Path) -> bool {
        op != WatchOp::Remove && self.fs.exists(path) && !self.fs.is_dir(path)
    }

    /// Release every subscription (shutdown).
    pub fn release(&mut self) {
        self.directories.unsubscribe_all();
    }

    pub fn directories(&self) -> &DirectoryWatcher<S> {
        &self.directories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::fs::mock::MockFileSystem;
    use crate::types::PrecedenceMode;
    use crate::watch::source::SubscriptionHandle;
    use notify::event::{ModifyKind, RenameMode};
    use notify::{Event, EventKind};

    #[derive(Debug, Default)]
    struct NullSource;

    impl WatchSource for NullSource {
        fn subscribe(&mut self, _dir: &Path) -> Result<SubscriptionHandle> {
            Ok(SubscriptionHandle(0))
        }

        fn unsubscribe(&mut self, _dir: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn router(fs: &MockFileSystem) -> EventRouter<NullSource> {
        let rules = RuleEngine::new(
            "/proj",
            &["*.txt".to_string(), "./new".to_string()],
            &["skip".to_string()],
            PrecedenceMode::IncludeFirst,
        )
        .unwrap();
        let mut r = EventRouter::new(NullSource, Arc::new(rules), Arc::new(fs.clone()));
        r.start();
        r
    }

    #[test]
    fn write_to_included_file_is_forwarded() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/a.txt");
        let mut r = router(&fs);

        assert_eq!(
            r.route(WatchEvent::new("/proj/a.txt", WatchOp::Write)),
            Some(PathBuf::from("/proj/a.txt"))
        );
    }

    #[test]
    fn removals_and_vanished_files_are_not_forwarded() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/a.txt");
        let mut r = router(&fs);

        assert_eq!(r.route(WatchEvent::new("/proj/a.txt", WatchOp::Remove)), None);
        assert_eq!(r.route(WatchEvent::new("/proj/gone.txt", WatchOp::Write)), None);
    }

    #[test]
    fn default_and_excluded_paths_are_not_forwarded() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/a.md");
        fs.add_file("/proj/skip");
        let mut r = router(&fs);

        assert_eq!(r.route(WatchEvent::new("/proj/a.md", WatchOp::Write)), None);
        assert_eq!(r.route(WatchEvent::new("/proj/skip", WatchOp::Write)), None);
    }

    #[test]
    fn created_directory_is_subscribed_not_forwarded() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj");
        let mut r = router(&fs);
        assert_eq!(r.directories().len(), 1);

        // `./new` is an include rule, yet a directory is never actionable.
        fs.add_file("/proj/new/inner/x.txt");
        assert_eq!(r.route(WatchEvent::new("/proj/new", WatchOp::Create)), None);
        assert!(r.directories().is_watched(Path::new("/proj/new")));
        assert!(r.directories().is_watched(Path::new("/proj/new/inner")));
    }

    #[test]
    fn excluded_directory_creation_is_not_subscribed() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj");
        let mut r = router(&fs);

        fs.add_dir("/proj/skip");
        r.route(WatchEvent::new("/proj/skip", WatchOp::Create));
        assert!(!r.directories().is_watched(Path::new("/proj/skip")));
    }

    #[test]
    fn renamed_away_directory_is_released() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj/moving");
        let mut r = router(&fs);
        assert!(r.directories().is_watched(Path::new("/proj/moving")));

        fs.remove("/proj/moving");
        r.route(WatchEvent::new("/proj/moving", WatchOp::Rename));
        assert!(!r.directories().is_watched(Path::new("/proj/moving")));
    }

    #[test]
    fn directory_moved_in_as_bare_rename_is_subscribed() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj");
        let mut r = router(&fs);

        fs.add_dir("/proj/moved/inner");
        let raw = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
            .add_path(PathBuf::from("/proj/moved"));
        for event in WatchEvent::from_notify(raw) {
            assert_eq!(r.route(event), None);
        }
        assert!(r.directories().is_watched(Path::new("/proj/moved")));
        assert!(r.directories().is_watched(Path::new("/proj/moved/inner")));
    }

    #[test]
    fn directory_replaced_in_place_is_subscribed_again() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj/build/old");
        let mut r = router(&fs);
        assert!(r.directories().is_watched(Path::new("/proj/build/old")));

        // Another directory renamed over `build`: same path, new contents.
        fs.remove("/proj/build");
        fs.add_dir("/proj/build/new");
        r.route(WatchEvent::new("/proj/build", WatchOp::Create));

        assert!(r.directories().is_watched(Path::new("/proj/build")));
        assert!(r.directories().is_watched(Path::new("/proj/build/new")));
        assert!(!r.directories().is_watched(Path::new("/proj/build/old")));
    }

    #[test]
    fn relative_event_paths_resolve_against_root() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/a.txt");
        let mut r = router(&fs);

        assert_eq!(
            r.route(WatchEvent::new("a.txt", WatchOp::Create)),
            Some(PathBuf::from("/proj/a.txt"))
        );
    }
}
