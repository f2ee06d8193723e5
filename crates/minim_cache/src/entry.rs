//! The cached result of one minification.

use serde::{Deserialize, Serialize};

/// The output of a successful minification, as stored in a cache.
///
/// Entries are immutable once written; a changed input produces a new key.
/// The source map is kept as serialized JSON so entries stay independent of
/// the in-memory map representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The minified code.
    pub code: String,
    /// The minifier's output source map as JSON, if one was produced.
    pub map: Option<String>,
    /// Raw warning texts in the order the minifier emitted them.
    pub warnings: Vec<String>,
    /// Comments the minifier extracted from the code (license headers).
    pub extracted_comments: Vec<String>,
}

impl CacheEntry {
    /// Creates an entry with just minified code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
            warnings: Vec::new(),
            extracted_comments: Vec::new(),
        }
    }
}
