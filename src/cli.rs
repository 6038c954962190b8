// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::PrecedenceMode;

/// Command-line arguments for `exec-onchanges`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "exec-onchanges",
    version,
    about = "Run a command for every file that changes under a directory tree.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// When given, the file's directory becomes the watch root unless
    /// `--root` says otherwise.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Include glob; may be repeated.
    #[arg(short = 'i', long = "include", value_name = "GLOB")]
    pub includes: Vec<String>,

    /// Exclude glob; may be repeated.
    #[arg(short = 'e', long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Which rule list wins when a path matches both.
    #[arg(long, value_enum, value_name = "MODE")]
    pub precedence: Option<PrecedenceMode>,

    /// Quiet period before a batch runs (e.g. `500ms`, `1s`, `2m`).
    #[arg(long, value_name = "DURATION")]
    pub debounce: Option<String>,

    /// Token replaced with the changed path in every command argument.
    #[arg(long, value_name = "TOKEN")]
    pub placeholder: Option<String>,

    /// Directory to watch.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXEC_ONCHANGES_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and validate the configuration, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run; `{{FILEPATH}}` (or `--placeholder`) is replaced with
    /// the changed path.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
