// src/engine/mod.rs

//! Orchestration engine for exec-onchanges.
//!
//! This module ties together:
//! - the debouncer that collapses bursts of actionable paths into batches
//! - the consumer loop that reacts to:
//!   - raw watch events
//!   - the debounce deadline
//!   - shutdown signals
//!
//! The pure timing state machine lives in [`debounce`]; the async shell is
//! implemented in [`runtime`].

pub mod debounce;
pub mod runtime;

pub use debounce::{ChangeBatch, Debouncer};
pub use runtime::{Pipeline, PipelineHandle};
