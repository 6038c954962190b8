use std::path::PathBuf;
use std::time::Duration;

use exec_onchanges::config::PipelineConfig;
use exec_onchanges::exec::DEFAULT_PLACEHOLDER;
use exec_onchanges::types::PrecedenceMode;

/// Builder for `PipelineConfig` to simplify test setup.
///
/// Skips validation: the root is used as given, so pass a canonical path.
/// Defaults to no rules, a 1s window and `echo {{FILEPATH}}`.
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: PipelineConfig {
                root: root.into(),
                includes: Vec::new(),
                excludes: Vec::new(),
                precedence: PrecedenceMode::IncludeFirst,
                command: vec!["echo".to_string(), DEFAULT_PLACEHOLDER.to_string()],
                debounce: Duration::from_secs(1),
                placeholder: DEFAULT_PLACEHOLDER.to_string(),
            },
        }
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.config.includes.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.excludes.push(pattern.to_string());
        self
    }

    pub fn precedence(mut self, mode: PrecedenceMode) -> Self {
        self.config.precedence = mode;
        self
    }

    pub fn command(mut self, argv: &[&str]) -> Self {
        self.config.command = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.config.debounce = window;
        self
    }

    pub fn placeholder(mut self, token: &str) -> Self {
        self.config.placeholder = token.to_string();
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
