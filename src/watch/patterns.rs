// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::errors::{ExecOnchangesError, Result};
use crate::types::{Classification, PrecedenceMode};

/// One compiled include or exclude pattern.
///
/// Keeps the pattern as the user wrote it for logs and dry-run output; the
/// matcher works on the expanded, root-aware form.
#[derive(Clone)]
pub struct GlobRule {
    raw: String,
    expanded: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for GlobRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobRule")
            .field("raw", &self.raw)
            .field("expanded", &self.expanded)
            .finish_non_exhaustive()
    }
}

impl GlobRule {
    /// Compile `raw` relative to `root`.
    ///
    /// - Any `..` segment is rejected.
    /// - `./x` is anchored at `root`.
    /// - Absolute patterns and `**/` patterns are used verbatim.
    /// - Everything else matches at any depth (`**/` is prepended).
    pub fn compile(root: &Path, raw: &str) -> Result<Self> {
        let slashed = to_slash(raw);

        if slashed.split('/').any(|segment| segment == "..") {
            return Err(ExecOnchangesError::ConfigError(format!(
                "glob pattern '{raw}' must not contain a '..' segment"
            )));
        }

        let expanded = if let Some(rest) = slashed.strip_prefix("./") {
            let root = to_slash(&root.to_string_lossy());
            format!("{}/{}", globset::escape(root.trim_end_matches('/')), rest)
        } else if Path::new(raw).is_absolute()
            || slashed.starts_with('/')
            || slashed.starts_with("**/")
        {
            slashed.clone()
        } else {
            format!("**/{slashed}")
        };

        let matcher = GlobBuilder::new(&expanded)
            .literal_separator(true)
            .build()
            .map_err(|source| ExecOnchangesError::InvalidPattern {
                pattern: raw.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(Self {
            raw: raw.to_string(),
            expanded,
            matcher,
        })
    }

    /// The pattern as configured.
    pub fn pattern(&self) -> &str {
        &self.raw
    }

    /// The pattern actually compiled (after anchoring / `**/` expansion).
    pub fn expanded(&self) -> &str {
        &self.expanded
    }

    pub fn is_match(&self, abs_path: &str) -> bool {
        self.matcher.is_match(abs_path)
    }
}

/// Ordered include and exclude rules plus the precedence between them.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub include: Vec<GlobRule>,
    pub exclude: Vec<GlobRule>,
    pub precedence: PrecedenceMode,
}

/// Classifies absolute (or root-relative) paths as include / exclude /
/// default.
///
/// Built once at startup and never mutated, so it can be shared freely
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    root: PathBuf,
    rules: RuleSet,
}

impl RuleEngine {
    /// Compile all patterns. Any bad pattern fails construction.
    pub fn new(
        root: impl Into<PathBuf>,
        includes: &[String],
        excludes: &[String],
        precedence: PrecedenceMode,
    ) -> Result<Self> {
        let root = root.into();
        let include = compile_all(&root, includes)?;
        let exclude = compile_all(&root, excludes)?;

        Ok(Self {
            root,
            rules: RuleSet {
                include,
                exclude,
                precedence,
            },
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify a path. Relative paths are resolved against the root.
    ///
    /// Pure: the same path always yields the same answer.
    pub fn classify(&self, path: &Path) -> Classification {
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let abs = to_slash(&abs.to_string_lossy());

        let (first, second, first_hit, second_hit) = match self.rules.precedence {
            PrecedenceMode::IncludeFirst => (
                &self.rules.include,
                &self.rules.exclude,
                Classification::Include,
                Classification::Exclude,
            ),
            PrecedenceMode::ExcludeFirst => (
                &self.rules.exclude,
                &self.rules.include,
                Classification::Exclude,
                Classification::Include,
            ),
        };

        if first.iter().any(|rule| rule.is_match(&abs)) {
            first_hit
        } else if second.iter().any(|rule| rule.is_match(&abs)) {
            second_hit
        } else {
            Classification::Default
        }
    }
}

fn compile_all(root: &Path, patterns: &[String]) -> Result<Vec<GlobRule>> {
    patterns
        .iter()
        .map(|pat| GlobRule::compile(root, pat))
        .collect()
}

fn to_slash(s: &str) -> String {
    s.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(includes: &[&str], excludes: &[&str], precedence: PrecedenceMode) -> RuleEngine {
        let includes: Vec<String> = includes.iter().map(|s| s.to_string()).collect();
        let excludes: Vec<String> = excludes.iter().map(|s| s.to_string()).collect();
        RuleEngine::new("/proj", &includes, &excludes, precedence).unwrap()
    }

    #[test]
    fn bare_patterns_match_at_any_depth() {
        let e = engine(&["*.rs"], &[], PrecedenceMode::IncludeFirst);
        assert_eq!(e.classify(Path::new("/proj/main.rs")), Classification::Include);
        assert_eq!(
            e.classify(Path::new("/proj/src/deep/lib.rs")),
            Classification::Include
        );
        assert_eq!(e.classify(Path::new("/proj/README.md")), Classification::Default);
    }

    #[test]
    fn dot_slash_patterns_are_anchored_at_root() {
        let e = engine(&["./src/*.rs"], &[], PrecedenceMode::IncludeFirst);
        assert_eq!(e.rules().include[0].expanded(), "/proj/src/*.rs");
        assert_eq!(e.classify(Path::new("/proj/src/main.rs")), Classification::Include);
        // `*` does not cross a separator.
        assert_eq!(
            e.classify(Path::new("/proj/src/nested/main.rs")),
            Classification::Default
        );
        assert_eq!(
            e.classify(Path::new("/proj/other/src/main.rs")),
            Classification::Default
        );
    }

    #[test]
    fn absolute_and_double_star_patterns_are_verbatim() {
        let e = engine(&["/proj/a/*.txt", "**/b/*.txt"], &[], PrecedenceMode::IncludeFirst);
        assert_eq!(e.rules().include[0].expanded(), "/proj/a/*.txt");
        assert_eq!(e.rules().include[1].expanded(), "**/b/*.txt");
        assert_eq!(e.classify(Path::new("/proj/a/x.txt")), Classification::Include);
        assert_eq!(e.classify(Path::new("/proj/q/b/x.txt")), Classification::Include);
    }

    #[test]
    fn relative_paths_are_resolved_against_root() {
        let e = engine(&["./src/*.rs"], &[], PrecedenceMode::IncludeFirst);
        assert_eq!(e.classify(Path::new("src/main.rs")), Classification::Include);
    }

    #[test]
    fn parent_segments_are_rejected() {
        for bad in ["../x", "a/../b", "..", "a/.."] {
            let err = RuleEngine::new("/proj", &[bad.to_string()], &[], PrecedenceMode::IncludeFirst)
                .unwrap_err();
            assert!(
                matches!(err, ExecOnchangesError::ConfigError(ref msg) if msg.contains("..")),
                "pattern {bad} gave {err:?}"
            );
        }
    }

    #[test]
    fn malformed_glob_is_a_pattern_error() {
        let err = RuleEngine::new("/proj", &[], &["[unclosed".to_string()], PrecedenceMode::IncludeFirst)
            .unwrap_err();
        match err {
            ExecOnchangesError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "[unclosed"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn precedence_decides_overlapping_matches() {
        let inc = engine(&["*.rs"], &["./gen/**"], PrecedenceMode::IncludeFirst);
        let exc = engine(&["*.rs"], &["./gen/**"], PrecedenceMode::ExcludeFirst);
        let both = Path::new("/proj/gen/out.rs");

        assert_eq!(inc.classify(both), Classification::Include);
        assert_eq!(exc.classify(both), Classification::Exclude);

        // Only the exclude list matches: precedence is irrelevant.
        let only_excluded = Path::new("/proj/gen/out.txt");
        assert_eq!(inc.classify(only_excluded), Classification::Exclude);
        assert_eq!(exc.classify(only_excluded), Classification::Exclude);
    }

    #[test]
    fn no_rules_means_default() {
        let e = engine(&[], &[], PrecedenceMode::ExcludeFirst);
        assert_eq!(e.classify(Path::new("/proj/anything")), Classification::Default);
    }

    #[test]
    fn root_with_glob_metacharacters_is_literal() {
        let e = RuleEngine::new(
            "/work/[tmp]",
            &["./*.txt".to_string()],
            &[],
            PrecedenceMode::IncludeFirst,
        )
        .unwrap();
        assert_eq!(e.classify(Path::new("/work/[tmp]/a.txt")), Classification::Include);
        assert_eq!(e.classify(Path::new("/work/t/a.txt")), Classification::Default);
    }
}
