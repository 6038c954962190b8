// src/config/mod.rs

//! Configuration loading and validation for exec-onchanges.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file and merge it with CLI flags (`loader.rs`).
//! - Validate root, command, debounce and patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_DEBOUNCE, default_command, load_from_path, merge, resolve};
pub use model::{CommandSpec, PipelineConfig, RawConfigFile, RawPipelineConfig};
pub use validate::parse_duration;
