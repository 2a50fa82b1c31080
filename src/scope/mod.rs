//! Scope resolution
//!
//! Maps a logical scope (`project`, `engine`, `plugin`, `all`) onto the
//! registered source roots. Unknown scope strings fall back to the default
//! scope so agent queries never fail on a typo.

pub mod detect;

use crate::core::config::SourcesConfig;
use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Where a source root comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    ProjectSource,
    ProjectPlugin,
    EngineSource,
    EnginePlugin,
}

impl SourceOrigin {
    pub fn is_engine(&self) -> bool {
        matches!(self, SourceOrigin::EngineSource | SourceOrigin::EnginePlugin)
    }

    pub fn is_plugin(&self) -> bool {
        matches!(self, SourceOrigin::ProjectPlugin | SourceOrigin::EnginePlugin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOrigin::ProjectSource => "project_source",
            SourceOrigin::ProjectPlugin => "project_plugin",
            SourceOrigin::EngineSource => "engine_source",
            SourceOrigin::EnginePlugin => "engine_plugin",
        }
    }
}

/// Named subset of the registered roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    Project,
    Engine,
    Plugin,
    All,
}

impl SearchScope {
    /// Whether roots of `origin` belong to this scope
    pub fn includes(&self, origin: SourceOrigin) -> bool {
        match self {
            SearchScope::Project => !origin.is_engine(),
            SearchScope::Engine => origin.is_engine(),
            SearchScope::Plugin => origin.is_plugin(),
            SearchScope::All => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Project => "project",
            SearchScope::Engine => "engine",
            SearchScope::Plugin => "plugin",
            SearchScope::All => "all",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(SearchScope::Project),
            "engine" => Ok(SearchScope::Engine),
            "plugin" | "plugins" => Ok(SearchScope::Plugin),
            "all" => Ok(SearchScope::All),
            other => Err(format!("unknown scope: {}", other)),
        }
    }
}

/// A registered source root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRoot {
    pub path: PathBuf,
    pub origin: SourceOrigin,
}

/// Resolves scopes to ordered, deduplicated root lists
#[derive(Debug, Clone, Default)]
pub struct ScopeResolver {
    roots: Vec<SourceRoot>,
    default_scope: SearchScope,
}

impl ScopeResolver {
    pub fn new(default_scope: SearchScope) -> Self {
        Self {
            roots: Vec::new(),
            default_scope,
        }
    }

    /// Register the configured roots, auto-detecting plugins when enabled
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let mut resolver = Self::new(config.default_scope);

        if let Some(source) = &config.project_source {
            resolver.register(source, SourceOrigin::ProjectSource)?;
            if config.auto_detect_plugins {
                for plugin in detect::project_plugin_sources(source) {
                    resolver.register(plugin, SourceOrigin::ProjectPlugin)?;
                }
            }
        }

        if let Some(engine) = &config.engine_root {
            let layout = detect::engine_layout(engine);
            resolver.register(&layout.source, SourceOrigin::EngineSource)?;
            if config.auto_detect_plugins {
                for plugin in layout.plugins {
                    resolver.register(plugin, SourceOrigin::EnginePlugin)?;
                }
            }
        }

        for plugin in &config.plugins {
            resolver.register(&plugin.path, plugin.origin)?;
        }

        info!(
            roots = resolver.roots.len(),
            default_scope = %resolver.default_scope,
            plugins = resolver.plugin_paths().len(),
            "Registered source roots"
        );
        Ok(resolver)
    }

    /// Register a root. Returns `false` when the same path and origin were
    /// already registered; the same path under another origin is an error.
    pub fn register(&mut self, path: impl AsRef<Path>, origin: SourceOrigin) -> Result<bool> {
        let path = absolutize(path.as_ref())?;

        if let Some(existing) = self.roots.iter().find(|r| r.path == path) {
            if existing.origin == origin {
                return Ok(false);
            }
            return Err(Error::ScopeResolution {
                message: format!(
                    "{} is already registered as {} (attempted {})",
                    path.display(),
                    existing.origin.as_str(),
                    origin.as_str()
                ),
            });
        }

        debug!(path = %path.display(), origin = origin.as_str(), "Registered source root");
        self.roots.push(SourceRoot { path, origin });
        Ok(true)
    }

    pub fn roots(&self) -> &[SourceRoot] {
        &self.roots
    }

    pub fn default_scope(&self) -> SearchScope {
        self.default_scope
    }

    /// Parse a free-form scope, falling back to the default
    pub fn parse_scope(&self, scope: &str) -> SearchScope {
        scope.parse().unwrap_or(self.default_scope)
    }

    /// Resolve a free-form scope string into root paths (registration order)
    pub fn resolve(&self, scope: &str) -> Vec<PathBuf> {
        self.resolve_scope(self.parse_scope(scope))
    }

    pub fn resolve_scope(&self, scope: SearchScope) -> Vec<PathBuf> {
        self.roots
            .iter()
            .filter(|r| scope.includes(r.origin))
            .map(|r| r.path.clone())
            .collect()
    }

    pub fn has_plugin_source(&self) -> bool {
        self.roots.iter().any(|r| r.origin.is_plugin())
    }

    pub fn plugin_paths(&self) -> Vec<PathBuf> {
        self.resolve_scope(SearchScope::Plugin)
    }

    pub fn origin_of(&self, path: &Path) -> Option<SourceOrigin> {
        self.roots
            .iter()
            .find(|r| path.starts_with(&r.path))
            .map(|r| r.origin)
    }
}

/// Make a path absolute and lexically normalized, without touching the disk
fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
