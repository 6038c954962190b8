// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecOnchangesError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Root directory {path:?} cannot be resolved: {source}")]
    RootUnresolvable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Spawn error: {0}")]
    SpawnError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecOnchangesError {
    /// Whether this error must stop the pipeline from starting.
    ///
    /// Everything except configuration and root resolution is logged and
    /// survived by the running loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExecOnchangesError::ConfigError(_)
                | ExecOnchangesError::InvalidPattern { .. }
                | ExecOnchangesError::RootUnresolvable { .. }
                | ExecOnchangesError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ExecOnchangesError>;
