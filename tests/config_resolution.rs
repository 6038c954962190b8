// tests/config_resolution.rs

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use exec_onchanges::cli::CliArgs;
use exec_onchanges::config::resolve;
use exec_onchanges::dry_run_report;
use exec_onchanges::errors::ExecOnchangesError;
use exec_onchanges::types::PrecedenceMode;

type TestResult = Result<(), Box<dyn Error>>;

fn args(argv: &[&str]) -> CliArgs {
    let mut full = vec!["exec-onchanges"];
    full.extend_from_slice(argv);
    CliArgs::try_parse_from(full).expect("valid cli")
}

fn write_config(dir: &Path, body: &str) -> Result<String, Box<dyn Error>> {
    let path = dir.join("exec-onchanges.toml");
    fs::write(&path, body)?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn config_file_sets_root_and_splits_command() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file = write_config(
        dir.path(),
        r#"
command = "sh -c 'echo changed: {{FILEPATH}}'"
includes = ["*.go"]
excludes = ["vendor"]
precedence = "exclude-first"
debounce = "300ms"
"#,
    )?;

    let cfg = resolve(&args(&["-f", &file, "-i", "*.mod"]))?;

    assert_eq!(cfg.root, dir.path().canonicalize()?);
    assert_eq!(cfg.command, vec!["sh", "-c", "echo changed: {{FILEPATH}}"]);
    assert_eq!(cfg.includes, vec!["*.mod", "*.go"]);
    assert_eq!(cfg.excludes, vec!["vendor"]);
    assert_eq!(cfg.precedence, PrecedenceMode::ExcludeFirst);
    assert_eq!(cfg.debounce, Duration::from_millis(300));
    assert_eq!(cfg.placeholder, "{{FILEPATH}}");
    Ok(())
}

#[test]
fn defaults_apply_without_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().to_string_lossy().into_owned();

    let cfg = resolve(&args(&["--root", &root]))?;

    assert_eq!(cfg.command, vec!["echo", "detected file changed: {{FILEPATH}}"]);
    assert_eq!(cfg.debounce, Duration::from_secs(1));
    assert_eq!(cfg.precedence, PrecedenceMode::IncludeFirst);
    assert!(cfg.includes.is_empty());
    Ok(())
}

#[test]
fn missing_root_is_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().join("missing").to_string_lossy().into_owned();

    let err = resolve(&args(&["--root", &root])).unwrap_err();
    assert!(matches!(err, ExecOnchangesError::RootUnresolvable { .. }));
    assert!(err.is_fatal());
    Ok(())
}

#[test]
fn escaping_pattern_in_file_is_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file = write_config(dir.path(), "includes = [\"../sibling/*.rs\"]\n")?;

    let err = resolve(&args(&["-f", &file])).unwrap_err();
    assert!(matches!(err, ExecOnchangesError::ConfigError(_)));
    Ok(())
}

#[test]
fn malformed_glob_on_cli_is_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().to_string_lossy().into_owned();

    let err = resolve(&args(&["--root", &root, "-e", "[unclosed"])).unwrap_err();
    assert!(matches!(err, ExecOnchangesError::InvalidPattern { .. }));
    Ok(())
}

#[test]
fn zero_debounce_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().to_string_lossy().into_owned();

    let err = resolve(&args(&["--root", &root, "--debounce", "0s"])).unwrap_err();
    assert!(matches!(err, ExecOnchangesError::ConfigError(_)));
    Ok(())
}

#[test]
fn broken_toml_and_missing_file_are_reported() -> TestResult {
    let dir = tempfile::tempdir()?;
    let file = write_config(dir.path(), "includes = [\"*.rs\"\n")?;
    let err = resolve(&args(&["-f", &file])).unwrap_err();
    assert!(matches!(err, ExecOnchangesError::TomlError(_)));

    let missing = dir.path().join("nope.toml").to_string_lossy().into_owned();
    let err = resolve(&args(&["-f", &missing])).unwrap_err();
    assert!(matches!(err, ExecOnchangesError::IoError(_)));
    Ok(())
}

#[test]
fn dry_run_lists_rules_with_their_compiled_globs() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    let root_arg = root.to_string_lossy().into_owned();

    let cfg = resolve(&args(&["--root", &root_arg, "-i", "*.rs", "-e", "./target"]))?;
    let report = dry_run_report(&cfg)?;

    assert!(report.contains(&"includes (1):".to_string()));
    assert!(report.contains(&"  - *.rs -> **/*.rs".to_string()));
    let anchored = format!("  - ./target -> {}/target", root.display());
    assert!(
        report.iter().any(|l| l.starts_with("  - ./target -> ") && l.ends_with("/target")),
        "missing {anchored} in {report:?}"
    );
    Ok(())
}
