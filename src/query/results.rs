//! Query request and result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How a search query is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// All whitespace tokens must appear in a file; ranked by density
    #[default]
    Smart,
    /// One regular expression, line by line
    Regex,
    /// Like smart, in index order
    Tokens,
}

impl QueryMode {
    /// Parse a mode name, falling back to `Smart` for anything unknown
    pub fn parse_lenient(mode: &str) -> Self {
        mode.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Smart => "smart",
            QueryMode::Regex => "regex",
            QueryMode::Tokens => "tokens",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smart" => Ok(QueryMode::Smart),
            "regex" => Ok(QueryMode::Regex),
            "tokens" => Ok(QueryMode::Tokens),
            other => Err(format!("unknown query mode: {}", other)),
        }
    }
}

/// A C++ search request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub mode: QueryMode,
    /// Overrides the indexer allow-list for this query
    #[serde(default)]
    pub file_glob: Option<String>,
    /// Match comment text too; `false` blanks comments before matching
    #[serde(default = "default_include_comments")]
    pub include_comments: bool,
    pub max_results: usize,
    /// Free-form scope; unknown values use the default scope
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_include_comments() -> bool {
    true
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: QueryMode::Smart,
            file_glob: None,
            include_comments: true,
            max_results: 100,
            scope: None,
        }
    }

    pub fn mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn file_glob(mut self, glob: impl Into<String>) -> Self {
        self.file_glob = Some(glob.into());
        self
    }

    pub fn include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }
}

/// One textual hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// The matched text
    pub text: String,
    pub file: PathBuf,
    /// 1-indexed
    pub line: u32,
    /// 1-indexed byte column
    pub column: u32,
    /// Trimmed source line
    pub context: String,
    /// Innermost class whose body holds the line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Ordered matches plus truncation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub matches: Vec<Occurrence>,
    /// Count before truncation
    pub total_count: usize,
    pub truncated: bool,
    /// Mode actually used after fallback resolution
    pub mode: QueryMode,
    pub searched_paths: Vec<PathBuf>,
}

impl SearchResult {
    pub fn empty(mode: QueryMode, searched_paths: Vec<PathBuf>) -> Self {
        Self {
            matches: Vec::new(),
            total_count: 0,
            truncated: false,
            mode,
            searched_paths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Outcome of a single-entity lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound { name: String },
}

impl<T> Lookup<T> {
    pub fn not_found(name: impl Into<String>) -> Self {
        Lookup::NotFound { name: name.into() }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound { .. } => None,
        }
    }

    pub fn into_found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound { .. } => None,
        }
    }
}

/// Trim a source line for display
pub(crate) fn context_snippet(line: &str) -> String {
    const MAX: usize = 240;
    let trimmed = line.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut end = MAX;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_mode() {
        assert_eq!(QueryMode::parse_lenient("REGEX"), QueryMode::Regex);
        assert_eq!(QueryMode::parse_lenient("fuzzy"), QueryMode::Smart);
        assert_eq!(QueryMode::parse_lenient(""), QueryMode::Smart);
    }

    #[test]
    fn test_lookup_serialization() {
        #[derive(Serialize)]
        struct Item {
            name: String,
        }

        let found = serde_json::to_value(Lookup::Found(Item {
            name: "UThing".to_string(),
        }))
        .unwrap();
        assert_eq!(found["status"], "found");
        assert_eq!(found["name"], "UThing");

        let missing = serde_json::to_value(Lookup::<Item>::not_found("UGhost")).unwrap();
        assert_eq!(missing["status"], "not_found");
        assert_eq!(missing["name"], "UGhost");
    }

    #[test]
    fn test_context_snippet() {
        assert_eq!(context_snippet("    float Health;  "), "float Health;");
        let long = "x".repeat(500);
        assert_eq!(context_snippet(&long).len(), 243);
    }
}
