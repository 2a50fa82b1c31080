use crate::core::config::IndexConfig;
use crate::core::error::{Error, Result};
use crate::parse::pattern::FilePattern;
use ignore::{DirEntry, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directories produced by UnrealBuildTool and the editor, never source
const ARTIFACT_DIRS: &[&str] = &["Intermediate", "Binaries", "Saved", "DerivedDataCache"];

/// A file the walker declined, reported as an index warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Files selected under one root
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// Walks a source root respecting .gitignore
pub struct FileWalker {
    root: PathBuf,
    pattern: FilePattern,
    max_file_size: u64,
}

impl FileWalker {
    pub fn new(root: &Path, config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            pattern: FilePattern::new(&config.file_pattern)?,
            max_file_size: config.max_file_size,
        })
    }

    /// Walk all indexable files under the root, sorted by path
    pub fn walk(&self) -> Result<WalkOutcome> {
        if !self.root.is_dir() {
            return Err(Error::RootUnreadable {
                path: self.root.clone(),
                message: "not a readable directory".to_string(),
            });
        }

        let mut outcome = WalkOutcome::default();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)           // Skip hidden files
            .git_ignore(true)       // Respect .gitignore
            .git_global(false)      // Ignore the global gitignore
            .git_exclude(true)      // Respect .git/info/exclude
            .require_git(false)     // Work even without .git
            .filter_entry(|entry| !is_artifact_dir(entry))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    outcome.skipped.push(SkippedFile {
                        path: self.root.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().map_or(false, |t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if !self.pattern.matches(relative) {
                continue;
            }

            match entry.metadata() {
                Ok(meta) if meta.len() > self.max_file_size => {
                    outcome.skipped.push(SkippedFile {
                        path: path.to_path_buf(),
                        reason: format!(
                            "file is {} bytes, above the {} byte limit",
                            meta.len(),
                            self.max_file_size
                        ),
                    });
                }
                Ok(_) => outcome.files.push(path.to_path_buf()),
                Err(e) => outcome.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }),
            }
        }

        outcome.files.sort();
        debug!(
            root = %self.root.display(),
            files = outcome.files.len(),
            skipped = outcome.skipped.len(),
            "Walked source root"
        );
        Ok(outcome)
    }
}

fn is_artifact_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().map_or(false, |t| t.is_dir())
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| ARTIFACT_DIRS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_walk_selects_sources() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Game/Public/Health.h", "class A {};");
        write(root, "Game/Private/Health.cpp", "#include \"Health.h\"");
        write(root, "Game/Game.Build.cs", "// build rules");
        write(root, "Game/Intermediate/Gen.generated.h", "class Gen {};");
        write(root, "Binaries/Thing.h", "class Bin {};");

        let walker = FileWalker::new(root, &IndexConfig::default()).unwrap();
        let outcome = walker.walk().unwrap();

        assert_eq!(
            outcome.files,
            vec![
                root.join("Game/Private/Health.cpp"),
                root.join("Game/Public/Health.h"),
            ]
        );
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_oversized_files_are_reported() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Big.h", &"x".repeat(64));
        write(temp.path(), "Small.h", "x");

        let config = IndexConfig {
            max_file_size: 16,
            ..IndexConfig::default()
        };
        let outcome = FileWalker::new(temp.path(), &config).unwrap().walk().unwrap();

        assert_eq!(outcome.files, vec![temp.path().join("Small.h")]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].path, temp.path().join("Big.h"));
    }

    #[test]
    fn test_missing_root_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let walker = FileWalker::new(&temp.path().join("nope"), &IndexConfig::default()).unwrap();
        assert!(matches!(walker.walk(), Err(Error::RootUnreadable { .. })));
    }
}
