//! The cache store contract and the in-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key::CacheKey;

/// A content-addressed store of minification results.
///
/// Entries are inserted, never updated in place: setting a key that is
/// already present replaces the `Arc`, so a reader holding the old entry
/// still sees a complete value.
pub trait CacheStore: Send + Sync {
    /// Looks up an entry. A missing or unreadable entry is `Ok(None)`.
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<CacheEntry>>, CacheError>;

    /// Stores an entry under `key`.
    fn set(&self, key: &CacheKey, entry: Arc<CacheEntry>) -> Result<(), CacheError>;

    /// Returns `true` if an entry exists for `key`.
    fn has(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    /// Persists any buffered state. Called once at the end of a build.
    fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// A process-scoped store backed by a hash map.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, Arc<CacheEntry>>>,
}

impl MemoryCache {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<CacheEntry>>, CacheError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &CacheKey, entry: Arc<CacheEntry>) -> Result<(), CacheError> {
        self.entries.write().insert(*key, entry);
        Ok(())
    }

    fn has(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.entries.read().contains_key(key))
    }
}
