// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling include / exclude glob patterns against the root.
//! - Wiring up a cross-platform filesystem watcher (`notify`), one
//!   non-recursive subscription per directory.
//! - Keeping the set of subscribed directories in step with the tree.
//! - Turning raw events into actionable paths.
//!
//! It does **not** know about timing or processes; debouncing and execution
//! live in `engine` and `exec`.

pub mod directories;
pub mod patterns;
pub mod router;
pub mod source;

pub use directories::DirectoryWatcher;
pub use patterns::{GlobRule, RuleEngine, RuleSet};
pub use router::EventRouter;
pub use source::{NotifyWatchSource, SubscriptionHandle, WatchEvent, WatchOp, WatchSource};
