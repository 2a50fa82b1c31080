//! File selection globs
//!
//! `glob::Pattern` has no brace alternation, so `*.{h,cpp}` is expanded
//! into one pattern per alternative before compiling.

use crate::core::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled file glob with brace alternation
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    patterns: Vec<Pattern>,
    /// Match against the root-relative path instead of the file name
    match_path: bool,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let source = pattern.trim().to_string();
        if source.is_empty() {
            return Err(Error::InvalidQuery {
                message: "empty file pattern".to_string(),
            });
        }

        let patterns = expand_braces(&source)
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| Error::InvalidQuery {
                    message: format!("invalid file pattern '{}': {}", source, e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            match_path: source.contains('/'),
            source,
            patterns,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test a path relative to its source root
    pub fn matches(&self, relative: &Path) -> bool {
        let candidate = if self.match_path {
            relative.to_string_lossy().replace('\\', "/")
        } else {
            match relative.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => return false,
            }
        };

        self.patterns
            .iter()
            .any(|p| p.matches_with(&candidate, MATCH_OPTIONS))
    }
}

/// Expand `{a,b}` groups, nesting allowed. Unbalanced braces are left as-is.
fn expand_braces(pattern: &str) -> Vec<String> {
    let open = match pattern.find('{') {
        Some(i) => i,
        None => return vec![pattern.to_string()],
    };

    let mut depth = 0usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (i, c) in pattern[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(open + i),
            _ => {}
        }
    }

    let close = match close {
        Some(c) => c,
        None => return vec![pattern.to_string()],
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    let mut bounds = vec![open];
    bounds.extend(splits);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| {
            let alternative = &pattern[w[0] + 1..w[1]];
            expand_braces(&format!("{}{}{}", prefix, alternative, suffix))
        })
        .collect()
}
