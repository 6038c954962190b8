// src/exec/template.rs

use std::path::Path;

/// Placeholder substituted with the changed path when none is configured.
pub const DEFAULT_PLACEHOLDER: &str = "{{FILEPATH}}";

/// The configured argv with placeholder tokens still in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    args: Vec<String>,
    placeholder: String,
}

impl CommandTemplate {
    pub fn new(args: Vec<String>, placeholder: impl Into<String>) -> Self {
        Self {
            args,
            placeholder: placeholder.into(),
        }
    }

    /// Replace every occurrence of the placeholder, in every element, with
    /// `path`.
    pub fn render(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(&self.placeholder, &path))
            .collect()
    }
}
