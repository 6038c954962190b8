use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Which rule list is consulted first when a path could match both.
///
/// - `IncludeFirst`: a path matching any include rule is included, even if an
///   exclude rule also matches (default behaviour).
/// - `ExcludeFirst`: a path matching any exclude rule is excluded, even if an
///   include rule also matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PrecedenceMode {
    IncludeFirst,
    ExcludeFirst,
}

impl Default for PrecedenceMode {
    fn default() -> Self {
        PrecedenceMode::IncludeFirst
    }
}

impl FromStr for PrecedenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "include-first" | "include" => Ok(PrecedenceMode::IncludeFirst),
            "exclude-first" | "exclude" => Ok(PrecedenceMode::ExcludeFirst),
            other => Err(format!(
                "invalid precedence: {other} (expected \"include-first\" or \"exclude-first\")"
            )),
        }
    }
}

impl fmt::Display for PrecedenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecedenceMode::IncludeFirst => f.write_str("include-first"),
            PrecedenceMode::ExcludeFirst => f.write_str("exclude-first"),
        }
    }
}

/// Result of testing a path against the rule set.
///
/// `Default` means neither list matched. It is its own outcome and must not
/// be read as `Include`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Default,
    Include,
    Exclude,
}
