//! The host's asset set.

use std::collections::BTreeMap;

use serde_json::Value;

/// One named output of the host build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Asset {
    /// The asset's text.
    pub content: String,
    /// The asset's source map in its raw JSON form, if it has one.
    ///
    /// This is untrusted: the pipeline checks its shape before use and
    /// treats a malformed map as absent.
    pub source_map: Option<Value>,
    /// Set once the asset has been minified; minified assets are skipped.
    pub minimized: bool,
}

impl Asset {
    /// Creates an asset without a source map.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_map: None,
            minimized: false,
        }
    }

    /// Attaches a raw source map.
    pub fn with_source_map(mut self, map: Value) -> Self {
        self.source_map = Some(map);
        self
    }
}

/// Access to the host's assets by name.
///
/// The pipeline reads a snapshot at the start of a build and only writes
/// back once every task has finished.
pub trait AssetSet {
    /// Names of all current assets, in the host's iteration order.
    fn names(&self) -> Vec<String>;

    /// A copy of the named asset.
    fn get(&self, name: &str) -> Option<Asset>;

    /// Replaces an existing asset's content and map.
    fn replace(&mut self, name: &str, asset: Asset);

    /// Adds a new asset. Returns `false` and leaves the set unchanged if the
    /// name is taken.
    fn insert(&mut self, name: &str, asset: Asset) -> bool;

    /// Returns `true` if an asset with this name exists.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// An [`AssetSet`] held in memory, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSet {
    assets: BTreeMap<String, Asset>,
}

impl MemoryAssetSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` if the set has no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Borrows the named asset.
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }
}

impl<N: Into<String>> FromIterator<(N, Asset)> for MemoryAssetSet {
    fn from_iter<I: IntoIterator<Item = (N, Asset)>>(iter: I) -> Self {
        Self {
            assets: iter.into_iter().map(|(n, a)| (n.into(), a)).collect(),
        }
    }
}

impl AssetSet for MemoryAssetSet {
    fn names(&self) -> Vec<String> {
        self.assets.keys().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<Asset> {
        self.assets.get(name).cloned()
    }

    fn replace(&mut self, name: &str, asset: Asset) {
        if let Some(slot) = self.assets.get_mut(name) {
            *slot = asset;
        }
    }

    fn insert(&mut self, name: &str, asset: Asset) -> bool {
        if self.assets.contains_key(name) {
            return false;
        }
        self.assets.insert(name.to_string(), asset);
        true
    }

    fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }
}
