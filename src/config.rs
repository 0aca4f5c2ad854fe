use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::matcher::{MatchOptions, PathMatcher};

/// Files annotated when no pattern is configured.
pub const DEFAULT_MATCH: &str = "**/*.{html,htm}";

/// Plugin options, e.g. `{"match": "**/*.css", "matchOptions": {"nocase": true}}`.
/// Missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    #[serde(rename = "match")]
    pub pattern: String,
    pub match_options: MatchOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_MATCH.to_string(),
            match_options: MatchOptions::default(),
        }
    }
}

impl Options {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_match(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_match_options(mut self, match_options: MatchOptions) -> Self {
        self.match_options = match_options;
        self
    }

    /// Compiles the configured pattern. An empty pattern means the default.
    pub fn matcher(&self) -> Result<PathMatcher> {
        let pattern = if self.pattern.is_empty() {
            DEFAULT_MATCH
        } else {
            &self.pattern
        };
        PathMatcher::new(pattern, &self.match_options)
    }
}
