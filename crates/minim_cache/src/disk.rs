//! Persistent cache store.
//!
//! Entries are bincode-encoded [`CacheEntry`] payloads written through the
//! [`ArtifactStore`]. The manifest records which keys belong to the current
//! tool version; it is written on [`CacheStore::flush`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::artifact::ArtifactStore;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::manifest::CacheManifest;
use crate::store::CacheStore;

/// A cache store that persists entries under a directory.
pub struct DiskCache {
    dir: PathBuf,
    tool_version: String,
    artifacts: ArtifactStore,
    manifest: Mutex<CacheManifest>,
}

impl DiskCache {
    /// Opens (or creates) a disk cache rooted at `dir`.
    ///
    /// A manifest from a different tool version is discarded; its entries
    /// become unreferenced and are removed by the next [`DiskCache::gc`].
    pub fn open(dir: &Path, tool_version: &str) -> Result<Self, CacheError> {
        let artifacts = ArtifactStore::new(dir);
        artifacts.ensure_dirs()?;

        let manifest = match CacheManifest::load(dir) {
            Some(m) if m.is_compatible(tool_version) => m,
            Some(m) => {
                tracing::debug!(
                    cached = %m.tool_version,
                    current = tool_version,
                    "cache written by another version, starting fresh"
                );
                CacheManifest::new(tool_version)
            }
            None => CacheManifest::new(tool_version),
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            tool_version: tool_version.to_string(),
            artifacts,
            manifest: Mutex::new(manifest),
        })
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of entries referenced by the manifest.
    pub fn len(&self) -> usize {
        self.manifest.lock().entries.len()
    }

    /// Returns `true` if the manifest references no entries.
    pub fn is_empty(&self) -> bool {
        self.manifest.lock().entries.is_empty()
    }

    /// Removes artifact files not referenced by the manifest.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let manifest = self.manifest.lock();
        let live: Vec<&str> = manifest.entries.iter().map(String::as_str).collect();
        self.artifacts.gc(&live)
    }
}

impl CacheStore for DiskCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<CacheEntry>>, CacheError> {
        let name = key.to_string();
        let Some(payload) = self.artifacts.read_artifact(&name, &self.tool_version) else {
            return Ok(None);
        };

        match bincode::serde::decode_from_slice::<CacheEntry, _>(
            &payload,
            bincode::config::standard(),
        ) {
            Ok((entry, _)) => {
                self.manifest.lock().entries.insert(name);
                Ok(Some(Arc::new(entry)))
            }
            Err(e) => {
                tracing::debug!(key = %name, error = %e, "undecodable cache entry");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &CacheKey, entry: Arc<CacheEntry>) -> Result<(), CacheError> {
        let payload = bincode::serde::encode_to_vec(entry.as_ref(), bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        let name = key.to_string();
        self.artifacts
            .write_artifact(&name, &payload, &self.tool_version)?;
        self.manifest.lock().entries.insert(name);
        Ok(())
    }

    fn flush(&self) -> Result<(), CacheError> {
        self.manifest.lock().save(&self.dir)
    }
}
