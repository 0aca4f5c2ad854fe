//! Glob selection of file paths.
//!
//! Patterns follow the usual shell-glob conventions on top of `glob::Pattern`:
//! `*` stays inside one path component, `**/` spans any number of
//! directories, `{a,b}` expands to alternatives and a leading `!` negates.

use glob::Pattern;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::{PluginError, Result};

/// Matcher switches. Names mirror the pattern options build tools commonly
/// accept, so a JSON config like `{"nocase": true, "dot": true}` just works.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchOptions {
    /// Case-insensitive matching.
    pub nocase: bool,
    /// Let wildcards match a leading `.` in a path component.
    pub dot: bool,
    /// Match slash-free patterns against the basename only.
    pub match_base: bool,
    /// Disable `{a,b}` expansion.
    pub nobrace: bool,
    /// Treat a leading `!` literally.
    pub nonegate: bool,
}

impl MatchOptions {
    fn glob_options(&self) -> glob::MatchOptions {
        glob::MatchOptions {
            case_sensitive: !self.nocase,
            require_literal_separator: true,
            require_literal_leading_dot: !self.dot,
        }
    }
}

/// Compiled path predicate.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    source: String,
    patterns: Vec<Pattern>,
    negated: bool,
    basename_only: bool,
    options: glob::MatchOptions,
}

impl PathMatcher {
    pub fn new(pattern: &str, options: &MatchOptions) -> Result<Self> {
        let (negated, body) = if options.nonegate {
            (false, pattern)
        } else {
            split_negation(pattern)
        };
        let alternatives = if options.nobrace {
            vec![body.to_string()]
        } else {
            expand_braces(body)
        };
        let patterns = alternatives
            .iter()
            .map(|alt| {
                Pattern::new(alt).map_err(|source| PluginError::Pattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: pattern.to_string(),
            patterns,
            negated,
            basename_only: options.match_base && !body.contains('/'),
            options: options.glob_options(),
        })
    }

    /// The pattern as configured, before expansion.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let candidate = if self.basename_only {
            path.rsplit('/').next().unwrap_or(path)
        } else {
            path
        };
        let hit = self
            .patterns
            .iter()
            .any(|p| p.matches_with(candidate, self.options));
        hit != self.negated
    }
}

// An odd number of leading `!` negates.
fn split_negation(pattern: &str) -> (bool, &str) {
    let bangs = pattern.chars().take_while(|&c| c == '!').count();
    (bangs % 2 == 1, &pattern[bangs..])
}

/// Expands `{a,b}` groups, innermost alternatives included.
///
/// A group without a top-level comma or without a closing brace is literal.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close, commas)) = find_group(pattern) else {
        return vec![pattern.to_string()];
    };
    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    let mut bounds = Vec::with_capacity(commas.len() + 2);
    bounds.push(open);
    bounds.extend(commas);
    bounds.push(close);

    bounds
        .iter()
        .tuple_windows()
        .flat_map(|(&start, &end)| {
            let alt = &pattern[start + 1..end];
            expand_braces(&format!("{prefix}{alt}{suffix}"))
        })
        .unique()
        .collect()
}

// First `{...}` with at least one top-level comma: (open, close, commas).
fn find_group(pattern: &str) -> Option<(usize, usize, Vec<usize>)> {
    let bytes = pattern.as_bytes();
    for open in (0..bytes.len()).filter(|&i| bytes[i] == b'{') {
        let mut depth = 0usize;
        let mut commas = Vec::new();
        for (i, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        if !commas.is_empty() {
                            return Some((open, i, commas));
                        }
                        break;
                    }
                }
                b',' if depth == 1 => commas.push(i),
                _ => {}
            }
        }
    }
    None
}
