//! Text search over an index view
//!
//! `smart` and `tokens` match whole files (every token must appear);
//! `regex` matches single lines. Scanning runs on the rayon pool, file
//! order is preserved before ranking.

use rayon::prelude::*;
use regex::Regex;
use std::cmp::Ordering;

use super::results::{context_snippet, Occurrence, QueryMode, SearchRequest, SearchResult};
use crate::core::error::{Error, Result};
use crate::index::{IndexView, IndexedFile};
use crate::parse::FilePattern;

const REGEX_METACHARACTERS: &[char] = &[
    '\\', '.', '^', '$', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|',
];

/// The mode a query actually runs in.
///
/// A single-word smart/tokens query that looks like a regular expression
/// and compiles as one runs as a regex.
pub fn resolve_mode(query: &str, requested: QueryMode) -> QueryMode {
    if requested == QueryMode::Regex {
        return QueryMode::Regex;
    }
    let query = query.trim();
    let looks_like_regex = !query.is_empty()
        && !query.contains(char::is_whitespace)
        && query.contains(REGEX_METACHARACTERS)
        && Regex::new(query).is_ok();

    if looks_like_regex {
        QueryMode::Regex
    } else {
        requested
    }
}

/// Run a search against `view`
pub fn search(view: &IndexView, request: &SearchRequest) -> Result<SearchResult> {
    let mode = resolve_mode(&request.query, request.mode);
    let searched_paths = view.root_paths();

    let filter = match request.file_glob.as_deref().map(str::trim) {
        Some(glob) if !glob.is_empty() => Some(FilePattern::new(glob)?),
        _ => None,
    };

    let files: Vec<&IndexedFile> = view
        .files()
        .filter(|f| filter.as_ref().map_or(true, |p| p.matches(&f.relative)))
        .collect();

    let mut matches = match mode {
        QueryMode::Regex => regex_matches(&files, &request.query, request.include_comments)?,
        QueryMode::Smart | QueryMode::Tokens => {
            let tokens = tokenize(&request.query);
            if tokens.is_empty() {
                return Ok(SearchResult::empty(mode, searched_paths));
            }
            let mut hits = token_matches(&files, &request.query, &tokens, request.include_comments);
            if mode == QueryMode::Smart {
                hits.sort_by(rank_order);
            } else {
                for hit in &mut hits {
                    hit.score = None;
                }
            }
            hits
        }
    };

    let total_count = matches.len();
    let truncated = total_count > request.max_results;
    matches.truncate(request.max_results);

    Ok(SearchResult {
        matches,
        total_count,
        truncated,
        mode,
        searched_paths,
    })
}

/// Whole-identifier, case-sensitive occurrences outside comments
pub fn references(view: &IndexView, identifier: &str) -> Result<Vec<Occurrence>> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(Error::InvalidQuery {
            message: "empty identifier".to_string(),
        });
    }

    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(identifier))).map_err(|e| {
        Error::InvalidQuery {
            message: e.to_string(),
        }
    })?;

    let files: Vec<&IndexedFile> = view.files().collect();
    let found: Vec<Vec<Occurrence>> = files
        .par_iter()
        .map(|file| {
            let mut out = Vec::new();
            for (idx, line) in file.lines.iter().enumerate() {
                let line_no = idx as u32 + 1;
                if file.is_comment_line(line_no) {
                    continue;
                }
                for m in pattern.find_iter(file.text(idx, false)) {
                    out.push(Occurrence {
                        text: m.as_str().to_string(),
                        file: file.path.clone(),
                        line: line_no,
                        column: m.start() as u32 + 1,
                        context: context_snippet(line),
                        enclosing_class: file
                            .enclosing_class(line_no)
                            .map(|c| c.qualified_name.to_string()),
                        score: None,
                    });
                }
            }
            out
        })
        .collect();

    Ok(found.into_iter().flatten().collect())
}

fn tokenize(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in query.split_whitespace().map(|t| t.to_ascii_lowercase()) {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

fn regex_matches(files: &[&IndexedFile], query: &str, include_comments: bool) -> Result<Vec<Occurrence>> {
    let pattern = Regex::new(query).map_err(|e| Error::InvalidQuery {
        message: format!("invalid regex '{}': {}", query, e),
    })?;

    let per_file: Vec<Vec<Occurrence>> = files
        .par_iter()
        .map(|file| {
            file.lines
                .iter()
                .enumerate()
                .filter_map(|(idx, line)| {
                    let line_no = idx as u32 + 1;
                    if !include_comments && file.is_comment_line(line_no) {
                        return None;
                    }
                    pattern.find(file.text(idx, include_comments)).map(|m| Occurrence {
                        text: m.as_str().to_string(),
                        file: file.path.clone(),
                        line: line_no,
                        column: m.start() as u32 + 1,
                        context: context_snippet(line),
                        enclosing_class: None,
                        score: None,
                    })
                })
                .collect()
        })
        .collect();

    Ok(per_file.into_iter().flatten().collect())
}

fn token_matches(
    files: &[&IndexedFile],
    query: &str,
    tokens: &[String],
    include_comments: bool,
) -> Vec<Occurrence> {
    files
        .par_iter()
        .filter_map(|file| score_file(file, query, tokens, include_comments))
        .collect()
}

/// One occurrence at the line with the most distinct tokens, if the file
/// contains every token
fn score_file(file: &IndexedFile, query: &str, tokens: &[String], include_comments: bool) -> Option<Occurrence> {
    let mut frequency = vec![0usize; tokens.len()];
    // (line index, distinct tokens, column of first hit)
    let mut best: Option<(usize, usize, usize)> = None;

    for idx in 0..file.lines.len() {
        if !include_comments && file.is_comment_line(idx as u32 + 1) {
            continue;
        }
        let lower = file.text(idx, include_comments).to_ascii_lowercase();
        let mut distinct = 0;
        let mut first_col = usize::MAX;
        for (t, token) in tokens.iter().enumerate() {
            let mut count = 0;
            for (pos, _) in lower.match_indices(token.as_str()) {
                count += 1;
                first_col = first_col.min(pos);
            }
            if count > 0 {
                distinct += 1;
                frequency[t] += count;
            }
        }
        if distinct > 0 && best.map_or(true, |(_, d, _)| distinct > d) {
            best = Some((idx, distinct, first_col));
        }
    }

    if frequency.iter().any(|f| *f == 0) {
        return None;
    }
    let (idx, distinct, column) = best?;

    let score = 10.0 * distinct as f64
        + frequency
            .iter()
            .map(|f| (1.0 + *f as f64).ln())
            .sum::<f64>();

    let line = &file.lines[idx];
    Some(Occurrence {
        text: query.trim().to_string(),
        file: file.path.clone(),
        line: idx as u32 + 1,
        column: column as u32 + 1,
        context: context_snippet(line),
        enclosing_class: None,
        score: Some(score),
    })
}

fn rank_order(a: &Occurrence, b: &Occurrence) -> Ordering {
    let (sa, sb) = (a.score.unwrap_or(0.0), b.score.unwrap_or(0.0));
    sb.partial_cmp(&sa)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.file.cmp(&b.file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::IndexConfig;
    use crate::index::IndexStore;
    use tempfile::TempDir;

    fn view_of(files: &[(&str, &str)]) -> (TempDir, IndexView) {
        let temp = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = temp.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let store = IndexStore::new(&IndexConfig::default()).unwrap();
        let view = store.ensure(&[temp.path().to_path_buf()]).unwrap();
        (temp, view)
    }

    fn file_names(result: &SearchResult) -> Vec<String> {
        result
            .matches
            .iter()
            .map(|m| m.file.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_smart_ranking_and_truncation() {
        let (_temp, view) = view_of(&[
            ("A.h", "// health\nfloat Health;\nvoid Regen();\n"),
            ("B.h", "float Health; float RegenRate;\nfloat HealthRegen;\n"),
            ("C.h", "Health\nRegen\n"),
            ("D.h", "int HealthRegenPerSecond; float HealthRegenDelay; bool bRegenHealth;\n"),
            ("E.h", "void Regen(); float Health; // health regen health regen health regen\n"),
            ("F.h", "float Health;\n"),
        ]);

        let request = SearchRequest::new("Health Regen")
            .max_results(2)
            .include_comments(false);
        let result = search(&view, &request).unwrap();

        assert_eq!(result.mode, QueryMode::Smart);
        assert_eq!(result.total_count, 5);
        assert!(result.truncated);
        assert_eq!(result.matches.len(), 2);
        // D has both tokens on one line and the highest code frequency
        assert_eq!(file_names(&result), vec!["D.h", "B.h"]);
        assert_eq!(result.matches[0].line, 1);

        // Trailing comment text counts once comments are included
        let result = search(&view, &request.clone().include_comments(true)).unwrap();
        assert_eq!(file_names(&result), vec!["E.h", "D.h"]);
    }

    #[test]
    fn test_tokens_mode_keeps_index_order() {
        let (_temp, view) = view_of(&[
            ("A.h", "Health\nRegen\n"),
            ("B.h", "HealthRegen HealthRegen HealthRegen\n"),
        ]);

        let request = SearchRequest::new("regen HEALTH").mode(QueryMode::Tokens);
        let result = search(&view, &request).unwrap();
        assert_eq!(file_names(&result), vec!["A.h", "B.h"]);
        assert!(result.matches.iter().all(|m| m.score.is_none()));
        assert!(!result.truncated);
    }

    #[test]
    fn test_comment_exclusion() {
        let (_temp, view) = view_of(&[
            ("A.h", "// Stamina lives here\nint X;\n"),
            ("B.h", "float Stamina;\n"),
            ("C.h", "int Y; /* stamina */ int Z; // stamina note\n"),
        ]);

        let result = search(&view, &SearchRequest::new("stamina")).unwrap();
        assert_eq!(result.total_count, 3);

        let result = search(&view, &SearchRequest::new("stamina").include_comments(false)).unwrap();
        assert_eq!(file_names(&result), vec!["B.h"]);

        let request = SearchRequest::new("(?i)stamina|note")
            .mode(QueryMode::Regex)
            .include_comments(false);
        let result = search(&view, &request).unwrap();
        assert_eq!(file_names(&result), vec!["B.h"]);
    }

    #[test]
    fn test_regex_mode_counts_lines() {
        let (_temp, view) = view_of(&[("A.h", "float Health;\nint Ammo;\nfloat Armor;\n")]);

        let request = SearchRequest::new(r"float \w+").mode(QueryMode::Regex);
        let result = search(&view, &request).unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.matches[0].text, "float Health");
        assert_eq!(result.matches[1].line, 3);
    }

    #[test]
    fn test_mode_fallback() {
        assert_eq!(resolve_mode("Get.*Health", QueryMode::Smart), QueryMode::Regex);
        assert_eq!(resolve_mode("Health Regen", QueryMode::Smart), QueryMode::Smart);
        assert_eq!(resolve_mode("UHealth", QueryMode::Tokens), QueryMode::Tokens);
        assert_eq!(resolve_mode("Foo(", QueryMode::Smart), QueryMode::Smart);

        let (_temp, view) = view_of(&[("A.h", "void GetHealth();\n")]);
        let result = search(&view, &SearchRequest::new("Get.*Health")).unwrap();
        assert_eq!(result.mode, QueryMode::Regex);
        assert_eq!(result.total_count, 1);
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let (_temp, view) = view_of(&[("A.h", "x\n")]);
        let request = SearchRequest::new("Foo(").mode(QueryMode::Regex);
        assert!(matches!(search(&view, &request), Err(Error::InvalidQuery { .. })));
    }

    #[test]
    fn test_file_glob_filter() {
        let (_temp, view) = view_of(&[
            ("Public/A.h", "Shield\n"),
            ("Private/A.cpp", "Shield\n"),
        ]);

        let result = search(&view, &SearchRequest::new("shield").file_glob("*.cpp")).unwrap();
        assert_eq!(file_names(&result), vec!["A.cpp"]);

        let result = search(&view, &SearchRequest::new("shield").file_glob("Public/*")).unwrap();
        assert_eq!(file_names(&result), vec!["A.h"]);
    }

    #[test]
    fn test_empty_view_is_empty_result() {
        let store = IndexStore::new(&IndexConfig::default()).unwrap();
        let view = store.ensure(&[]).unwrap();
        let result = search(&view, &SearchRequest::new("anything")).unwrap();
        assert!(result.is_empty());
        assert!(!result.truncated);
        assert!(result.searched_paths.is_empty());
    }

    #[test]
    fn test_references_are_whole_identifier() {
        let (temp, view) = view_of(&[(
            "A.h",
            "class UHealthComponent;\nclass AHero\n{\n    // UHealthComponent in a comment\n    UHealthComponent* Health;\n    UHealthComponentBase* Other;\n};\n",
        )]);

        let found = references(&view, "UHealthComponent").unwrap();
        let lines: Vec<u32> = found.iter().map(|o| o.line).collect();
        assert_eq!(lines, vec![1, 5]);
        assert_eq!(found[1].column, 5);
        assert_eq!(found[1].enclosing_class.as_deref(), Some("AHero"));
        assert_eq!(found[0].file, temp.path().join("A.h"));

        assert!(references(&view, "uhealthcomponent").unwrap().is_empty());
        assert!(references(&view, "  ").is_err());
    }
}
