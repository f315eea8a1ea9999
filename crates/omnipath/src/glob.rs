//! Shell-style pattern matching shared by every backend.
//!
//! `*` matches any run of characters except `/`, `?` matches any single
//! character, everything else is literal. The translated regex is anchored
//! at the start only: `a/*` against `a/b/c` matches and captures `a/b`.
//! Callers receive the captured text, not the candidate, so prefix-style
//! patterns can yield directory-like results.

use regex::Regex;
use std::collections::HashSet;

use crate::error::{PathError, PathResult};

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a shell pattern into a start-anchored regex.
    pub fn new(pattern: &str) -> PathResult<Self> {
        let regex_text = Self::translate(pattern);
        let regex = Regex::new(&regex_text)
            .map_err(|e| PathError::invalid_path(format!("glob {pattern:?}: {e}")))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    fn translate(pattern: &str) -> String {
        let mut text = String::from("^(");
        let mut buf = [0u8; 4];
        for c in pattern.chars() {
            match c {
                '*' => text.push_str("[^/]*"),
                '?' => text.push('.'),
                other => text.push_str(&regex::escape(other.encode_utf8(&mut buf))),
            }
        }
        text.push(')');
        text
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Literal text before the first wildcard; useful for narrowing listings.
    pub fn literal_prefix(&self) -> &str {
        let end = self
            .pattern
            .find(['*', '?'])
            .unwrap_or(self.pattern.len());
        &self.pattern[..end]
    }

    /// The captured match if `candidate` starts with something the pattern accepts.
    pub fn match_prefix<'a>(&self, candidate: &'a str) -> Option<&'a str> {
        self.regex
            .captures(candidate)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Captured matches over `candidates`, deduplicated, in first-seen order.
    pub fn filter<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for candidate in candidates {
            if let Some(captured) = self.match_prefix(candidate.as_ref()) {
                if seen.insert(captured.to_string()) {
                    matches.push(captured.to_string());
                }
            }
        }
        matches
    }
}
