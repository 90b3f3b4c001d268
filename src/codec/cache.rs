// Content-identity keyed object cache.
//
// Records whose content did not change between two runs map to the same content-version
// identifier, so the parsed representation from an earlier run can be reused as-is.

use parking_lot::RwLock;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::properties::Requirement;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: String,
    version_id: String,
}

/// Thread-safe, insert-once store of parsed requirements keyed by `(kind, version_id)`.
///
/// Entries are `Arc`s that are never mutated after insertion; sets built from a cache hit work on
/// their own clone. Cloning the cache is cheap and yields a handle to the same store, so one cache
/// can outlive and serve many graph constructions.
///
/// Nothing is evicted implicitly: a superseded content version stays until
/// [`ObjectCache::retain_versions`] (or [`ObjectCache::clear`]) drops it.
#[derive(Debug, Default)]
pub struct ObjectCache(Arc<RwLock<HashMap<CacheKey, Arc<Requirement>>>>);

impl Clone for ObjectCache {
    fn clone(&self) -> Self {
        ObjectCache(self.0.clone())
    }
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached node for this kind and content version, if any.
    pub fn get(&self, kind: &str, version_id: &str) -> Option<Arc<Requirement>> {
        let reader = self.0.read();
        reader
            .get(&CacheKey {
                kind: kind.to_string(),
                version_id: version_id.to_string(),
            })
            .cloned()
    }

    /// Store a node under `(kind, version_id)`.
    ///
    /// If an entry already exists it is kept and returned, so there is at most one live node per
    /// key.
    pub fn put(&self, version_id: &str, kind: &str, node: Requirement) -> Arc<Requirement> {
        let mut writer = self.0.write();
        let entry = writer
            .entry(CacheKey {
                kind: kind.to_string(),
                version_id: version_id.to_string(),
            })
            .or_insert_with(|| {
                tracing::debug!(
                    "[ObjectCache::put] caching {} [{}] under version {}",
                    kind,
                    node.id,
                    version_id
                );
                Arc::new(node)
            });
        entry.clone()
    }

    /// Drop every entry of `kind` whose content version is not in `keep`. Returns the number of
    /// dropped entries.
    pub fn retain_versions(&self, kind: &str, keep: &HashSet<String>) -> usize {
        let mut writer = self.0.write();
        let before = writer.len();
        writer.retain(|key, _| key.kind != kind || keep.contains(&key.version_id));
        let dropped = before - writer.len();
        if dropped > 0 {
            tracing::debug!("[ObjectCache::retain_versions] dropped {} {} entries", dropped, kind);
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn clear(&self) {
        self.0.write().clear();
    }
}
