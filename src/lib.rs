// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{PipelineConfig, resolve};
use crate::engine::Pipeline;
use crate::exec::RealProcessSpawner;
use crate::fs::RealFileSystem;
use crate::watch::{NotifyWatchSource, RuleEngine};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the notify-backed watch source
/// - the pipeline (router, debouncer, scheduler)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve(&args)?;

    if args.dry_run {
        return print_dry_run(&cfg);
    }

    let (source, event_rx) = NotifyWatchSource::new()?;
    let pipeline = Pipeline::from_config(
        &cfg,
        source,
        event_rx,
        RealProcessSpawner,
        Arc::new(RealFileSystem),
    )?;

    info!(
        root = %cfg.root.display(),
        command = ?cfg.command,
        debounce = ?cfg.debounce,
        "watching for changes"
    );
    let handle = pipeline.spawn();

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C");
    handle.stop().await?;
    Ok(())
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &PipelineConfig) -> Result<()> {
    for line in dry_run_report(cfg)? {
        println!("{line}");
    }
    debug!("dry-run complete (no watching)");
    Ok(())
}

/// The resolved configuration as printed by `--dry-run`.
///
/// Each rule is listed as written, followed by the glob it compiles to.
pub fn dry_run_report(cfg: &PipelineConfig) -> Result<Vec<String>> {
    let rules = RuleEngine::new(cfg.root.clone(), &cfg.includes, &cfg.excludes, cfg.precedence)?;
    let rules = rules.rules();

    let mut lines = vec![
        "exec-onchanges dry-run".to_string(),
        format!("  root = {}", cfg.root.display()),
        format!("  command = {:?}", cfg.command),
        format!("  placeholder = {}", cfg.placeholder),
        format!("  debounce = {:?}", cfg.debounce),
        format!("  precedence = {}", cfg.precedence),
        String::new(),
    ];
    for (label, list) in [("includes", &rules.include), ("excludes", &rules.exclude)] {
        lines.push(format!("{label} ({}):", list.len()));
        for rule in list {
            lines.push(format!("  - {} -> {}", rule.pattern(), rule.expanded()));
        }
    }
    Ok(lines)
}
