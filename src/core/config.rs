//! Configuration management
//!
//! Values are layered: built-in defaults, then `config.toml`, then the
//! environment variables the analyzer has always honoured
//! (`CPP_SOURCE_PATH`, `UNREAL_ENGINE_PATH`, `UE_PLUGIN_HOST`,
//! `UE_PLUGIN_PORT`, `DEFAULT_SEARCH_SCOPE`), then command-line overrides.

use crate::core::error::{Error, Result};
use crate::scope::{SearchScope, SourceOrigin};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default port of the live introspection service
pub const DEFAULT_SERVICE_PORT: u16 = 8080;

pub const MAX_FILE_SIZE: u64 = 1_048_576; // 1MB

/// Extension allow-list used when no pattern is configured
pub const DEFAULT_FILE_PATTERN: &str = "*.{h,hpp,cpp,cc,inl}";

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub index: IndexConfig,
    pub service: ServiceConfig,
    pub trace: TraceConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Project C++ source root (usually `<Project>/Source`)
    pub project_source: Option<PathBuf>,
    /// Engine install or source checkout
    pub engine_root: Option<PathBuf>,
    /// Explicitly registered plugin source roots
    pub plugins: Vec<PluginSource>,
    /// Scope used when a query names none, or names an unknown one
    pub default_scope: SearchScope,
    /// Discover `Plugins/**/*.uplugin` next to project and engine roots
    pub auto_detect_plugins: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSource {
    pub path: PathBuf,
    #[serde(default = "default_plugin_origin")]
    pub origin: SourceOrigin,
}

fn default_plugin_origin() -> SourceOrigin {
    SourceOrigin::ProjectPlugin
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Glob selecting indexable files, brace alternation allowed
    pub file_pattern: String,
    /// Maximum file size to index (bytes)
    pub max_file_size: u64,
    /// Worker threads used to read and parse files
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Host of the live introspection service; unset means C++-only mode
    pub host: Option<String>,
    pub port: u16,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub max_depth: usize,
    pub max_visits: usize,
    /// Concurrent node expansions per BFS level
    pub fanout: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit per domain
    pub default_limit: usize,
    /// Cached search responses
    pub cache_size: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            project_source: None,
            engine_root: None,
            plugins: Vec::new(),
            default_scope: SearchScope::Project,
            auto_detect_plugins: true,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            max_file_size: MAX_FILE_SIZE,
            concurrency: cores.min(8),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_SERVICE_PORT,
            timeout_ms: 10_000,
        }
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_visits: 200,
            fanout: 8,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            cache_size: 256,
        }
    }
}

impl ServiceConfig {
    /// Whether a live service address was supplied
    pub fn is_configured(&self) -> bool {
        self.host.as_deref().map_or(false, |h| !h.trim().is_empty())
    }

    /// Base URL of the live service, `None` when no host is configured
    pub fn base_url(&self) -> Result<Option<Url>> {
        let host = match self.host.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => h,
            _ => return Ok(None),
        };

        let raw = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}:{}/", host, self.port)
        };

        let url = Url::parse(&raw).map_err(|e| Error::ConfigError {
            message: format!("Invalid live service address '{}': {}", raw, e),
        })?;
        Ok(Some(url))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl Config {
    /// Load configuration from the default location, then apply the environment
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("UE_ANALYZER_HOME") {
            return Ok(PathBuf::from(home).join("config.toml"));
        }

        ProjectDirs::from("dev", "ue-analyzer", "ue-analyzer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| Error::ConfigError {
                message: "Could not determine configuration directory".to_string(),
            })
    }

    /// Apply variable overrides from `lookup` (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("CPP_SOURCE_PATH") {
            self.sources.project_source = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty("UNREAL_ENGINE_PATH") {
            self.sources.engine_root = Some(PathBuf::from(path));
        }
        if let Some(host) = non_empty("UE_PLUGIN_HOST") {
            self.service.host = Some(host);
        }
        if let Some(port) = non_empty("UE_PLUGIN_PORT").and_then(|p| p.trim().parse().ok()) {
            self.service.port = port;
        }
        if let Some(scope) = non_empty("DEFAULT_SEARCH_SCOPE") {
            if let Ok(scope) = scope.parse() {
                self.sources.default_scope = scope;
            }
        }
    }
}
