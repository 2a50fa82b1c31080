//! Source Index Builder
//!
//! Walks one source root, reads and parses files on a bounded rayon pool,
//! and assembles an immutable `RootIndex`. Roots are built independently so
//! the store can cache them per root.
//!
//! @module index/builder

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use compact_str::CompactString;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::symbols::{ClassSymbol, ExposureAnnotation};
use crate::core::config::IndexConfig;
use crate::core::error::{Error, Result};
use crate::parse::{parse_bytes, FilePattern, FileWalker, ParsedFile};

// =============================================================================
// INDEX TYPES
// =============================================================================

/// A file that was skipped while indexing. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexWarning {
    pub path: PathBuf,
    pub message: String,
}

/// One parsed file
#[derive(Debug, Clone)]
pub struct IndexedFile {
    pub path: PathBuf,
    /// Path relative to the owning root
    pub relative: PathBuf,
    pub lines: Vec<String>,
    pub comment_lines: Vec<bool>,
    /// Comment-blanked text of lines that carry comment bytes
    code_lines: Vec<Option<String>>,
    pub classes: Vec<ClassSymbol>,
    pub annotations: Vec<ExposureAnnotation>,
}

impl IndexedFile {
    /// 1-indexed line text
    pub fn line(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        self.lines.get(idx).map(String::as_str)
    }

    /// Whether 1-indexed `line` holds only comment text
    pub fn is_comment_line(&self, line: u32) -> bool {
        (line as usize)
            .checked_sub(1)
            .and_then(|idx| self.comment_lines.get(idx).copied())
            .unwrap_or(false)
    }

    /// 0-indexed line text, with comment bytes blanked unless
    /// `include_comments`
    pub fn text(&self, idx: usize, include_comments: bool) -> &str {
        let original = self.lines.get(idx).map_or("", String::as_str);
        if include_comments {
            return original;
        }
        self.code_lines
            .get(idx)
            .and_then(Option::as_deref)
            .unwrap_or(original)
    }

    /// Innermost class definition spanning `line`
    pub fn enclosing_class(&self, line: u32) -> Option<&ClassSymbol> {
        self.classes
            .iter()
            .filter(|c| c.contains_line(line))
            .max_by_key(|c| c.line_start)
    }
}

/// Everything indexed under one source root
#[derive(Debug, Clone)]
pub struct RootIndex {
    pub root: PathBuf,
    /// Sorted by path
    pub files: Vec<IndexedFile>,
    pub warnings: Vec<IndexWarning>,
    /// Simple and qualified names to (file, class) positions
    by_name: HashMap<CompactString, Vec<(usize, usize)>>,
}

impl RootIndex {
    fn new(root: PathBuf, mut files: Vec<IndexedFile>, warnings: Vec<IndexWarning>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut by_name: HashMap<CompactString, Vec<(usize, usize)>> = HashMap::new();
        for (fi, file) in files.iter().enumerate() {
            for (ci, class) in file.classes.iter().enumerate() {
                by_name.entry(class.name.clone()).or_default().push((fi, ci));
                if class.qualified_name != class.name {
                    by_name
                        .entry(class.qualified_name.clone())
                        .or_default()
                        .push((fi, ci));
                }
            }
        }

        Self {
            root,
            files,
            warnings,
            by_name,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.files.iter().flat_map(|f| f.classes.iter())
    }

    /// Classes declared as `name` (simple or qualified), in file order
    pub fn classes_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassSymbol> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(move |(fi, ci)| &self.files[*fi].classes[*ci])
    }

    pub fn file(&self, path: &Path) -> Option<&IndexedFile> {
        self.files
            .binary_search_by(|f| f.path.as_path().cmp(path))
            .ok()
            .map(|i| &self.files[i])
    }

    pub fn class_count(&self) -> usize {
        self.files.iter().map(|f| f.classes.len()).sum()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builds `RootIndex` values on a dedicated worker pool
pub struct IndexBuilder {
    config: IndexConfig,
    pattern: FilePattern,
    pool: rayon::ThreadPool,
}

impl IndexBuilder {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency.max(1))
            .thread_name(|i| format!("ue-index-{}", i))
            .build()
            .map_err(|e| Error::IndexError {
                message: format!("failed to start index workers: {}", e),
            })?;

        Ok(Self {
            config: config.clone(),
            pattern: FilePattern::new(&config.file_pattern)?,
            pool,
        })
    }

    /// Index every selected file under `root`
    pub fn build_root(&self, root: &Path) -> Result<RootIndex> {
        let start = Instant::now();
        let outcome = FileWalker::new(root, &self.config)?.walk()?;

        let mut warnings: Vec<IndexWarning> = outcome
            .skipped
            .into_iter()
            .map(|s| IndexWarning {
                path: s.path,
                message: s.reason,
            })
            .collect();

        let files = self.parse_files(root, &outcome.files, &mut warnings);
        let index = RootIndex::new(root.to_path_buf(), files, warnings);

        info!(
            root = %root.display(),
            files = index.files.len(),
            classes = index.class_count(),
            warnings = index.warnings.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Indexed source root"
        );
        Ok(index)
    }

    /// New index for `base` with `changed` files re-read. Paths that no
    /// longer exist or no longer match are dropped.
    pub fn update_root(&self, base: &RootIndex, changed: &[PathBuf]) -> RootIndex {
        let changed: Vec<&PathBuf> = changed
            .iter()
            .filter(|p| p.starts_with(&base.root))
            .collect();

        let mut files: Vec<IndexedFile> = base
            .files
            .iter()
            .filter(|f| !changed.contains(&&f.path))
            .cloned()
            .collect();
        let mut warnings: Vec<IndexWarning> = base
            .warnings
            .iter()
            .filter(|w| !changed.contains(&&w.path))
            .cloned()
            .collect();

        let reparse: Vec<PathBuf> = changed
            .iter()
            .filter(|p| p.is_file() && self.accepts(&base.root, p, &mut warnings))
            .map(|p| p.to_path_buf())
            .collect();

        files.extend(self.parse_files(&base.root, &reparse, &mut warnings));

        debug!(
            root = %base.root.display(),
            changed = changed.len(),
            reparsed = reparse.len(),
            "Updated source root"
        );
        RootIndex::new(base.root.clone(), files, warnings)
    }

    fn accepts(&self, root: &Path, path: &Path, warnings: &mut Vec<IndexWarning>) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if !self.pattern.matches(relative) {
            return false;
        }
        match path.metadata() {
            Ok(meta) if meta.len() > self.config.max_file_size => {
                warnings.push(IndexWarning {
                    path: path.to_path_buf(),
                    message: format!(
                        "file is {} bytes, above the {} byte limit",
                        meta.len(),
                        self.config.max_file_size
                    ),
                });
                false
            }
            Ok(_) => true,
            Err(e) => {
                warnings.push(IndexWarning {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn parse_files(
        &self,
        root: &Path,
        paths: &[PathBuf],
        warnings: &mut Vec<IndexWarning>,
    ) -> Vec<IndexedFile> {
        let results: Vec<std::result::Result<IndexedFile, IndexWarning>> = self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| load_file(root, path))
                .collect()
        });

        let mut files = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(file) => files.push(file),
                Err(warning) => {
                    warn!(
                        file = %warning.path.display(),
                        reason = %warning.message,
                        "Skipped file"
                    );
                    warnings.push(warning);
                }
            }
        }
        files
    }
}

fn load_file(root: &Path, path: &Path) -> std::result::Result<IndexedFile, IndexWarning> {
    let warning = |message: String| IndexWarning {
        path: path.to_path_buf(),
        message,
    };

    let bytes = std::fs::read(path).map_err(|e| warning(e.to_string()))?;
    let ParsedFile {
        classes,
        annotations,
        comment_lines,
        code,
    } = parse_bytes(path, &bytes).map_err(|e| warning(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|e| warning(e.to_string()))?;
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    let code_lines = lines
        .iter()
        .zip(code.lines())
        .map(|(line, stripped)| (line.as_str() != stripped).then(|| stripped.to_string()))
        .collect();

    Ok(IndexedFile {
        path: path.to_path_buf(),
        relative: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
        lines,
        comment_lines,
        code_lines,
        classes,
        annotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn builder() -> IndexBuilder {
        IndexBuilder::new(&IndexConfig {
            concurrency: 2,
            ..IndexConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_build_root_tolerates_bad_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "A.h", b"class UA : public UObject {};\n");
        write(root, "B.h", b"class UB : public UA {};\n");
        write(root, "Binary.h", b"class\0 UBin {};");
        write(root, "Open.h", b"/* never closed\nclass UOpen {};\n");

        let index = builder().build_root(root).unwrap();
        assert_eq!(index.files.len(), 2);
        assert_eq!(index.warnings.len(), 2);
        assert_eq!(index.class_count(), 2);
        assert_eq!(index.classes_named("UB").next().unwrap().bases.as_slice(), &["UA"]);
        assert!(index.classes_named("UBin").next().is_none());
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let result = builder().build_root(&temp.path().join("missing"));
        assert!(matches!(result, Err(Error::RootUnreadable { .. })));
    }

    #[test]
    fn test_qualified_lookup_and_enclosing_class() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "Outer.h",
            b"class FOuter\n{\n    struct FInner\n    {\n        int X;\n    };\n};\n",
        );

        let index = builder().build_root(temp.path()).unwrap();
        assert!(index.classes_named("FOuter::FInner").next().is_some());
        assert!(index.classes_named("FInner").next().is_some());

        let file = index.file(&path).unwrap();
        assert_eq!(file.enclosing_class(5).unwrap().name, "FInner");
        assert_eq!(file.enclosing_class(7).unwrap().name, "FOuter");
        assert_eq!(file.relative, PathBuf::from("Outer.h"));
    }

    #[test]
    fn test_update_root() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "A.h", b"class UA {};\n");
        let b = write(temp.path(), "B.h", b"class UB {};\n");

        let builder = builder();
        let base = builder.build_root(temp.path()).unwrap();

        std::fs::write(&a, b"class UA2 {};\n").unwrap();
        std::fs::remove_file(&b).unwrap();
        let c = write(temp.path(), "C.h", b"class UC {};\n");

        let updated = builder.update_root(&base, &[a, b, c]);
        let names: Vec<_> = updated.classes().map(|c| c.name.to_string()).collect();
        assert_eq!(names, vec!["UA2", "UC"]);

        // base generation untouched
        assert_eq!(base.class_count(), 2);
        assert!(base.classes_named("UB").next().is_some());
    }
}
