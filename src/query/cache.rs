use super::results::{SearchRequest, SearchResult};
use lru::LruCache;
use std::num::NonZeroUsize;
use xxhash_rust::xxh3::xxh3_64;

/// Cache key: index generation plus a hash of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    generation: u64,
    request: u64,
}

impl CacheKey {
    pub fn new(generation: u64, request: &SearchRequest, roots: &[std::path::PathBuf]) -> Self {
        let mut material = serde_json::to_vec(request).unwrap_or_default();
        for root in roots {
            material.extend_from_slice(root.to_string_lossy().as_bytes());
            material.push(0);
        }
        Self {
            generation,
            request: xxh3_64(&material),
        }
    }
}

/// LRU cache for search results. Entries from older generations are never
/// hit again and age out.
pub struct QueryCache {
    cache: LruCache<CacheKey, SearchResult>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<SearchResult> {
        self.cache.get(key).cloned()
    }

    pub fn put(&mut self, key: CacheKey, value: SearchResult) {
        self.cache.put(key, value);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::results::QueryMode;
    use std::path::PathBuf;

    #[test]
    fn test_keys_depend_on_generation_and_request() {
        let roots = vec![PathBuf::from("/p/Source")];
        let request = SearchRequest::new("Health");

        let a = CacheKey::new(1, &request, &roots);
        assert_eq!(a, CacheKey::new(1, &request, &roots));
        assert_ne!(a, CacheKey::new(2, &request, &roots));
        assert_ne!(a, CacheKey::new(1, &request.clone().max_results(5), &roots));
        assert_ne!(a, CacheKey::new(1, &request, &[]));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = QueryCache::new(1);
        let roots: Vec<PathBuf> = Vec::new();
        let k1 = CacheKey::new(1, &SearchRequest::new("a"), &roots);
        let k2 = CacheKey::new(1, &SearchRequest::new("b"), &roots);

        cache.put(k1, SearchResult::empty(QueryMode::Smart, Vec::new()));
        cache.put(k2, SearchResult::empty(QueryMode::Regex, Vec::new()));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&k1).is_none());
        assert_eq!(cache.get(&k2).unwrap().mode, QueryMode::Regex);
    }
}
