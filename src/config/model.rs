// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::PrecedenceMode;

/// Config file as read from TOML.
///
/// ```toml
/// command = "cargo test --quiet"
/// includes = ["*.rs", "./Cargo.toml"]
/// excludes = ["target"]
/// precedence = "exclude-first"
/// debounce = "500ms"
/// placeholder = "{{FILEPATH}}"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub command: Option<CommandSpec>,

    #[serde(default)]
    pub includes: Vec<String>,

    #[serde(default)]
    pub excludes: Vec<String>,

    #[serde(default)]
    pub precedence: Option<PrecedenceMode>,

    #[serde(default)]
    pub debounce: Option<String>,

    #[serde(default)]
    pub placeholder: Option<String>,
}

/// A command either as one shell-quoted line or as an explicit argv.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Line(String),
    Args(Vec<String>),
}

/// CLI and file options merged, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPipelineConfig {
    pub root: PathBuf,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub precedence: PrecedenceMode,
    pub command: CommandSpec,
    pub debounce: String,
    pub placeholder: String,
}

/// Validated configuration the pipeline is built from.
///
/// Construct it through `TryFrom<RawPipelineConfig>` (see `validate.rs`) so
/// the root is canonical and the command is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub root: PathBuf,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub precedence: PrecedenceMode,
    pub command: Vec<String>,
    pub debounce: Duration,
    pub placeholder: String,
}
