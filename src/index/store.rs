//! Generational index store
//!
//! Root indexes are cached independently. Every build or update publishes a
//! whole new `SourceIndex` generation; readers keep the `Arc` they started
//! with, so a reindex never changes results under a running query.
//!
//! @module index/store

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::info;

use super::builder::{IndexBuilder, IndexWarning, IndexedFile, RootIndex};
use super::symbols::ClassSymbol;
use crate::core::config::IndexConfig;
use crate::core::error::Result;

/// One published generation
#[derive(Debug, Clone)]
pub struct SourceIndex {
    pub generation: u64,
    pub roots: HashMap<PathBuf, Arc<RootIndex>>,
    pub built_at: DateTime<Utc>,
}

impl SourceIndex {
    fn empty() -> Self {
        Self {
            generation: 0,
            roots: HashMap::new(),
            built_at: Utc::now(),
        }
    }

    fn successor(&self, roots: HashMap<PathBuf, Arc<RootIndex>>) -> Self {
        Self {
            generation: self.generation + 1,
            roots,
            built_at: Utc::now(),
        }
    }
}

/// The roots of one scope, taken from a single generation
#[derive(Debug, Clone)]
pub struct IndexView {
    generation: u64,
    parts: Vec<Arc<RootIndex>>,
}

impl IndexView {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|p| p.files.is_empty())
    }

    pub fn roots(&self) -> impl Iterator<Item = &RootIndex> {
        self.parts.iter().map(|p| p.as_ref())
    }

    pub fn root_paths(&self) -> Vec<PathBuf> {
        self.parts.iter().map(|p| p.root.clone()).collect()
    }

    /// Every file in scope order, then path order
    pub fn files(&self) -> impl Iterator<Item = &IndexedFile> {
        self.parts.iter().flat_map(|p| p.files.iter())
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.parts.iter().flat_map(|p| p.classes())
    }

    pub fn classes_named(&self, name: &str) -> Vec<&ClassSymbol> {
        self.parts
            .iter()
            .flat_map(|p| p.classes_named(name))
            .collect()
    }

    /// Resolve a class by simple or qualified name. A definition always
    /// wins over a forward declaration.
    pub fn find_class(&self, name: &str) -> Option<&ClassSymbol> {
        let candidates = self.classes_named(name.trim());
        candidates
            .iter()
            .find(|c| !c.is_forward)
            .or_else(|| candidates.first())
            .copied()
    }

    pub fn file(&self, path: &Path) -> Option<&IndexedFile> {
        self.parts.iter().find_map(|p| p.file(path))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &IndexWarning> {
        self.parts.iter().flat_map(|p| p.warnings.iter())
    }
}

/// Owns the current generation and serializes builds
pub struct IndexStore {
    builder: IndexBuilder,
    current: RwLock<Arc<SourceIndex>>,
    build_lock: Mutex<()>,
}

impl IndexStore {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            builder: IndexBuilder::new(config)?,
            current: RwLock::new(Arc::new(SourceIndex::empty())),
            build_lock: Mutex::new(()),
        })
    }

    pub fn snapshot(&self) -> Arc<SourceIndex> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// View over `roots`, building only those never indexed before
    pub fn ensure(&self, roots: &[PathBuf]) -> Result<IndexView> {
        let snapshot = self.snapshot();
        if roots.iter().all(|r| snapshot.roots.contains_key(r)) {
            return Ok(view_of(&snapshot, roots));
        }

        let _guard = self.build_lock.lock();
        // Another caller may have built them while we waited
        let snapshot = self.snapshot();
        let missing: Vec<&PathBuf> = roots
            .iter()
            .filter(|r| !snapshot.roots.contains_key(*r))
            .collect();
        if missing.is_empty() {
            return Ok(view_of(&snapshot, roots));
        }

        let mut next_roots = snapshot.roots.clone();
        for root in missing {
            let built = self.builder.build_root(root)?;
            next_roots.insert(root.clone(), Arc::new(built));
        }

        let next = Arc::new(snapshot.successor(next_roots));
        self.publish(next.clone());
        Ok(view_of(&next, roots))
    }

    /// Re-index `roots` from scratch, keeping other cached roots
    pub fn rebuild(&self, roots: &[PathBuf]) -> Result<IndexView> {
        let _guard = self.build_lock.lock();
        let snapshot = self.snapshot();

        let mut next_roots = snapshot.roots.clone();
        for root in roots {
            let built = self.builder.build_root(root)?;
            next_roots.insert(root.clone(), Arc::new(built));
        }

        let next = Arc::new(snapshot.successor(next_roots));
        self.publish(next.clone());
        Ok(view_of(&next, roots))
    }

    /// Re-read `changed` files in whichever cached roots contain them.
    /// Returns the generation that is current afterwards.
    pub fn update(&self, changed: &[PathBuf]) -> u64 {
        let _guard = self.build_lock.lock();
        let snapshot = self.snapshot();

        let mut next_roots = snapshot.roots.clone();
        let mut touched = 0;
        for (root, index) in &snapshot.roots {
            let relevant: Vec<PathBuf> = changed
                .iter()
                .filter(|p| p.starts_with(root))
                .cloned()
                .collect();
            if relevant.is_empty() {
                continue;
            }
            touched += 1;
            let updated = self.builder.update_root(index, &relevant);
            next_roots.insert(root.clone(), Arc::new(updated));
        }

        if touched == 0 {
            return snapshot.generation;
        }

        let next = Arc::new(snapshot.successor(next_roots));
        let generation = next.generation;
        self.publish(next);
        generation
    }

    fn publish(&self, next: Arc<SourceIndex>) {
        info!(
            generation = next.generation,
            roots = next.roots.len(),
            "Published index generation"
        );
        *self.current.write() = next;
    }
}

fn view_of(index: &SourceIndex, roots: &[PathBuf]) -> IndexView {
    IndexView {
        generation: index.generation,
        parts: roots
            .iter()
            .filter_map(|r| index.roots.get(r).cloned())
            .collect(),
    }
}
