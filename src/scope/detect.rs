//! Plugin and engine layout detection

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// How deep below a `Plugins` directory a `.uplugin` may sit
const PLUGIN_SEARCH_DEPTH: usize = 4;

/// Engine roots found under an engine install or checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLayout {
    pub source: PathBuf,
    pub plugins: Vec<PathBuf>,
}

/// Plugin source roots of a project, given its `<Project>/Source` directory
pub fn project_plugin_sources(project_source: &Path) -> Vec<PathBuf> {
    match project_source.parent() {
        Some(project_dir) => plugin_sources(&project_dir.join("Plugins")),
        None => Vec::new(),
    }
}

/// Work out the engine source root and its plugins.
///
/// Accepts an install root (`<Root>/Engine/Source`), the `Engine` directory
/// itself (`<Engine>/Source`), or a bare source directory.
pub fn engine_layout(engine_root: &Path) -> EngineLayout {
    let engine_dir = if engine_root.join("Engine").join("Source").is_dir() {
        Some(engine_root.join("Engine"))
    } else if engine_root.join("Source").is_dir() {
        Some(engine_root.to_path_buf())
    } else {
        None
    };

    match engine_dir {
        Some(dir) => EngineLayout {
            source: dir.join("Source"),
            plugins: plugin_sources(&dir.join("Plugins")),
        },
        None => EngineLayout {
            source: engine_root.to_path_buf(),
            plugins: Vec::new(),
        },
    }
}

/// Find `Source` directories of every `*.uplugin` below `plugins_dir`
fn plugin_sources(plugins_dir: &Path) -> Vec<PathBuf> {
    if !plugins_dir.is_dir() {
        return Vec::new();
    }

    let walker = WalkBuilder::new(plugins_dir)
        .standard_filters(false)
        .max_depth(Some(PLUGIN_SEARCH_DEPTH + 1))
        .build();

    let mut sources: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("uplugin"))
        })
        .filter_map(|entry| entry.path().parent().map(|dir| dir.join("Source")))
        .filter(|source| source.is_dir())
        .collect();

    sources.sort();
    sources.dedup();
    sources
}
