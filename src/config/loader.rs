// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{CommandSpec, PipelineConfig, RawConfigFile, RawPipelineConfig};
use crate::errors::Result;
use crate::exec::DEFAULT_PLACEHOLDER;

/// Debounce window used when neither the CLI nor the file sets one.
pub const DEFAULT_DEBOUNCE: &str = "1s";

/// Command used when neither the file nor the CLI provides one.
pub fn default_command() -> Vec<String> {
    vec![
        "echo".to_string(),
        format!("detected file changed: {DEFAULT_PLACEHOLDER}"),
    ]
}

/// Load a config file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization. Use [`resolve`] to merge it with
/// the CLI and validate the result.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Combine CLI arguments and an optional config file.
///
/// - root: `--root`, else the config file's directory, else `cwd`.
/// - command: file, else trailing CLI command, else [`default_command`].
/// - includes / excludes: CLI patterns followed by file patterns.
/// - scalars: CLI over file over defaults.
pub fn merge(args: &CliArgs, file: Option<RawConfigFile>, cwd: &Path) -> RawPipelineConfig {
    let file = file.unwrap_or_default();

    let root = match (&args.root, &args.file) {
        (Some(root), _) => cwd.join(root),
        (None, Some(config_path)) => config_root_dir(config_path, cwd),
        (None, None) => cwd.to_path_buf(),
    };

    let command = match file.command {
        Some(cmd) => cmd,
        None if !args.command.is_empty() => CommandSpec::Args(args.command.clone()),
        None => CommandSpec::Args(default_command()),
    };

    let mut includes = args.includes.clone();
    includes.extend(file.includes);
    let mut excludes = args.excludes.clone();
    excludes.extend(file.excludes);

    RawPipelineConfig {
        root,
        includes,
        excludes,
        precedence: args.precedence.or(file.precedence).unwrap_or_default(),
        command,
        debounce: args
            .debounce
            .clone()
            .or(file.debounce)
            .unwrap_or_else(|| DEFAULT_DEBOUNCE.to_string()),
        placeholder: args
            .placeholder
            .clone()
            .or(file.placeholder)
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
    }
}

/// Load the config file named by `args` (if any), merge, and validate.
///
/// This is the recommended entry point for the rest of the application.
pub fn resolve(args: &CliArgs) -> Result<PipelineConfig> {
    let cwd = std::env::current_dir()?;
    let file = match &args.file {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            Some(load_from_path(cwd.join(path))?)
        }
        None => None,
    };

    PipelineConfig::try_from(merge(args, file, &cwd))
}

/// The directory holding `config_path`, or `cwd` for a bare file name.
fn config_root_dir(config_path: &Path, cwd: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd.to_path_buf(),
    }
}
