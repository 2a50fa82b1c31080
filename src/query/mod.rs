//! Query engine over the C++ source index
//!
//! Every operation resolves its scope first, asks the store for a view of
//! exactly those roots (building any that were never indexed) and runs
//! against that one generation.

pub mod cache;
pub mod details;
pub mod hierarchy;
pub mod results;
pub mod search;

pub use cache::{CacheKey, QueryCache};
pub use details::{BlueprintExposure, ClassDetails, FilePatterns, MemberInfo};
pub use hierarchy::{ClassHierarchy, HierarchyNode, NodeStatus};
pub use results::{Lookup, Occurrence, QueryMode, SearchRequest, SearchResult};

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::core::config::SearchConfig;
use crate::core::error::{Error, Result};
use crate::index::{IndexStore, IndexView};
use crate::parse::{parse_bytes, ParsedFile};
use crate::scope::ScopeResolver;

pub struct QueryEngine {
    store: Arc<IndexStore>,
    resolver: Arc<ScopeResolver>,
    cache: Mutex<QueryCache>,
    default_limit: usize,
}

impl QueryEngine {
    pub fn new(store: Arc<IndexStore>, resolver: Arc<ScopeResolver>, config: &SearchConfig) -> Self {
        Self {
            store,
            resolver,
            cache: Mutex::new(QueryCache::new(config.cache_size)),
            default_limit: config.default_limit,
        }
    }

    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Roots of `scope`, or of the default scope when `None` or unknown
    pub fn roots(&self, scope: Option<&str>) -> Vec<PathBuf> {
        match scope {
            Some(scope) => self.resolver.resolve(scope),
            None => self.resolver.resolve_scope(self.resolver.default_scope()),
        }
    }

    /// Index view over a scope's roots
    pub fn view(&self, scope: Option<&str>) -> Result<IndexView> {
        let roots = self.roots(scope);
        self.store.ensure(&roots)
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        let view = self.view(request.scope.as_deref())?;
        let key = CacheKey::new(view.generation(), request, &view.root_paths());

        if let Some(hit) = self.cache.lock().get(&key) {
            debug!(query = %request.query, "Search cache hit");
            return Ok(hit);
        }

        let result = search::search(&view, request)?;
        debug!(
            query = %request.query,
            mode = %result.mode,
            total = result.total_count,
            truncated = result.truncated,
            "Search complete"
        );
        self.cache.lock().put(key, result.clone());
        Ok(result)
    }

    pub fn references(&self, identifier: &str, scope: Option<&str>) -> Result<Vec<Occurrence>> {
        let view = self.view(scope)?;
        search::references(&view, identifier)
    }

    pub fn hierarchy(
        &self,
        name: &str,
        include_interfaces: bool,
        scope: Option<&str>,
    ) -> Result<Lookup<ClassHierarchy>> {
        let view = self.view(scope)?;
        Ok(hierarchy::hierarchy(&view, name, include_interfaces))
    }

    pub fn details(
        &self,
        name: &str,
        include_inherited: bool,
        scope: Option<&str>,
    ) -> Result<Lookup<ClassDetails>> {
        let view = self.view(scope)?;
        Ok(details::details(&view, name, include_inherited))
    }

    /// Every UE macro in one file
    pub fn detect_patterns(&self, file: &Path) -> Result<Lookup<FilePatterns>> {
        Ok(match self.parse_file(file)? {
            Some((path, parsed)) => Lookup::Found(details::file_patterns(&path, &parsed)),
            None => Lookup::not_found(file.display().to_string()),
        })
    }

    /// Blueprint-exposed API in one file
    pub fn blueprint_exposure(&self, file: &Path) -> Result<Lookup<BlueprintExposure>> {
        Ok(match self.parse_file(file)? {
            Some((path, parsed)) => Lookup::Found(details::blueprint_exposure(&path, &parsed)),
            None => Lookup::not_found(file.display().to_string()),
        })
    }

    /// Read a file fresh from disk. Relative paths are tried against the
    /// working directory, then each registered root.
    fn parse_file(&self, file: &Path) -> Result<Option<(PathBuf, ParsedFile)>> {
        let candidates = std::iter::once(file.to_path_buf()).chain(
            self.resolver
                .roots()
                .iter()
                .filter(|_| file.is_relative())
                .map(|root| root.path.join(file)),
        );

        let path = match candidates.into_iter().find(|p| p.is_file()) {
            Some(path) => path,
            None => return Ok(None),
        };

        let bytes = std::fs::read(&path)?;
        let parsed = parse_bytes(&path, &bytes).map_err(|e| Error::IndexError {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(Some((path, parsed)))
    }
}
