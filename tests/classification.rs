// tests/classification.rs

use std::error::Error;
use std::path::Path;

use exec_onchanges::errors::ExecOnchangesError;
use exec_onchanges::types::{Classification, PrecedenceMode};
use exec_onchanges::watch::RuleEngine;
use proptest::prelude::*;

type TestResult = Result<(), Box<dyn Error>>;

fn engine(includes: &[&str], excludes: &[&str], mode: PrecedenceMode) -> RuleEngine {
    let inc: Vec<String> = includes.iter().map(|s| s.to_string()).collect();
    let exc: Vec<String> = excludes.iter().map(|s| s.to_string()).collect();
    RuleEngine::new("/proj", &inc, &exc, mode).expect("patterns compile")
}

#[test]
fn overlapping_rules_follow_precedence() -> TestResult {
    let path = Path::new("/proj/src/generated/api.rs");

    let include_first = engine(&["*.rs"], &["generated/*"], PrecedenceMode::IncludeFirst);
    assert_eq!(include_first.classify(path), Classification::Include);

    let exclude_first = engine(&["*.rs"], &["generated/*"], PrecedenceMode::ExcludeFirst);
    assert_eq!(exclude_first.classify(path), Classification::Exclude);
    Ok(())
}

#[test]
fn unmatched_path_is_default_not_include() -> TestResult {
    let e = engine(&["*.rs"], &["target"], PrecedenceMode::IncludeFirst);
    assert_eq!(e.classify(Path::new("/proj/README.md")), Classification::Default);
    assert_ne!(e.classify(Path::new("/proj/README.md")), Classification::Include);
    Ok(())
}

#[test]
fn anchored_pattern_only_matches_at_root() -> TestResult {
    let e = engine(&["./Cargo.toml"], &[], PrecedenceMode::IncludeFirst);
    assert_eq!(e.classify(Path::new("/proj/Cargo.toml")), Classification::Include);
    assert_eq!(
        e.classify(Path::new("/proj/crates/x/Cargo.toml")),
        Classification::Default
    );
    Ok(())
}

#[test]
fn traversal_pattern_is_a_config_error() {
    let err = RuleEngine::new(
        "/proj",
        &["src/../../etc/*".to_string()],
        &[],
        PrecedenceMode::IncludeFirst,
    )
    .unwrap_err();
    assert!(matches!(err, ExecOnchangesError::ConfigError(_)));
}

#[test]
fn malformed_glob_is_an_invalid_pattern() {
    let err = RuleEngine::new(
        "/proj",
        &[],
        &["src/{a,b".to_string()],
        PrecedenceMode::IncludeFirst,
    )
    .unwrap_err();
    assert!(matches!(err, ExecOnchangesError::InvalidPattern { .. }));
}

fn path_strategy() -> impl Strategy<Value = String> {
    let segment = prop::sample::select(vec![
        "src", "target", "docs", "a", "b", "lib.rs", "main.rs", "x.md", "y.txt",
    ]);
    prop::collection::vec(segment, 1..6)
        .prop_map(|segments| format!("/proj/{}", segments.join("/")))
}

proptest! {
    #[test]
    fn classify_is_deterministic(path in path_strategy()) {
        let e = engine(&["*.rs", "./docs/**"], &["target", "*.md"], PrecedenceMode::IncludeFirst);
        let first = e.classify(Path::new(&path));
        for _ in 0..3 {
            prop_assert_eq!(e.classify(Path::new(&path)), first);
        }
    }

    #[test]
    fn precedence_only_matters_when_both_lists_match(path in path_strategy()) {
        let inc = engine(&["*.rs", "*.md"], &["*.md", "target"], PrecedenceMode::IncludeFirst);
        let exc = engine(&["*.rs", "*.md"], &["*.md", "target"], PrecedenceMode::ExcludeFirst);
        let p = Path::new(&path);

        let a = inc.classify(p);
        let b = exc.classify(p);
        if a != b {
            // The path must have matched both lists.
            prop_assert_eq!(a, Classification::Include);
            prop_assert_eq!(b, Classification::Exclude);
        }
        if path.ends_with(".md") {
            prop_assert_eq!(a, Classification::Include);
            prop_assert_eq!(b, Classification::Exclude);
        }
    }
}
