// src/config/validate.rs

use std::time::Duration;

use regex::Regex;

use crate::config::model::{CommandSpec, PipelineConfig, RawPipelineConfig};
use crate::errors::{ExecOnchangesError, Result};
use crate::watch::GlobRule;

const DURATION_PATTERN: &str = r"(?i)^\s*(\d+)\s*(ms|s|m|h)\s*$";

impl TryFrom<RawPipelineConfig> for PipelineConfig {
    type Error = ExecOnchangesError;

    fn try_from(raw: RawPipelineConfig) -> std::result::Result<Self, Self::Error> {
        let root = validate_root(&raw)?;
        let command = split_command(&raw.command)?;
        validate_placeholder(&raw.placeholder)?;
        let debounce = parse_debounce(&raw.debounce)?;
        validate_patterns(&root, &raw.includes)?;
        validate_patterns(&root, &raw.excludes)?;

        Ok(PipelineConfig {
            root,
            includes: raw.includes,
            excludes: raw.excludes,
            precedence: raw.precedence,
            command,
            debounce,
            placeholder: raw.placeholder,
        })
    }
}

fn validate_root(raw: &RawPipelineConfig) -> Result<std::path::PathBuf> {
    let root = raw
        .root
        .canonicalize()
        .map_err(|source| ExecOnchangesError::RootUnresolvable {
            path: raw.root.clone(),
            source,
        })?;

    if !root.is_dir() {
        return Err(ExecOnchangesError::ConfigError(format!(
            "root '{}' is not a directory",
            root.display()
        )));
    }
    Ok(root)
}

fn split_command(spec: &CommandSpec) -> Result<Vec<String>> {
    let argv = match spec {
        CommandSpec::Line(line) => shlex::split(line).ok_or_else(|| {
            ExecOnchangesError::ConfigError(format!(
                "command '{line}' has unbalanced quotes or a trailing escape"
            ))
        })?,
        CommandSpec::Args(args) => args.clone(),
    };

    match argv.first() {
        None => Err(ExecOnchangesError::ConfigError(
            "command must not be empty".to_string(),
        )),
        Some(program) if program.trim().is_empty() => Err(ExecOnchangesError::ConfigError(
            "command program must not be empty".to_string(),
        )),
        Some(_) => Ok(argv),
    }
}

fn validate_placeholder(placeholder: &str) -> Result<()> {
    if placeholder.is_empty() {
        return Err(ExecOnchangesError::ConfigError(
            "placeholder must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_debounce(s: &str) -> Result<Duration> {
    let window = parse_duration(s).map_err(ExecOnchangesError::ConfigError)?;
    if window.is_zero() {
        return Err(ExecOnchangesError::ConfigError(format!(
            "debounce must be greater than zero (got '{s}')"
        )));
    }
    Ok(window)
}

fn validate_patterns(root: &std::path::Path, patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        GlobRule::compile(root, pattern)?;
    }
    Ok(())
}

/// Parse `<digits><unit>` where unit is one of `ms`, `s`, `m`, `h`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let re = Regex::new(DURATION_PATTERN).map_err(|e| format!("duration pattern: {e}"))?;
    let caps = re.captures(s).ok_or_else(|| {
        format!("invalid duration '{s}'; expected a number followed by ms, s, m, or h")
    })?;

    let value: u64 = caps[1]
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", &caps[1], e))?;

    let secs = |mult: u64| {
        value
            .checked_mul(mult)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' is too large"))
    };

    match caps[2].to_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => secs(1),
        "m" => secs(60),
        "h" => secs(60 * 60),
        unit => Err(format!("unsupported duration unit '{unit}'")),
    }
}
