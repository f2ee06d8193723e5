//! Deterministic cache key derivation.
//!
//! A key covers every input that can change the bytes a minifier produces:
//! the source text, the effective options, the minifier's identity and
//! version, this tool's version, and whether a source map was requested.
//! Callers may fold in extra material (for instance a build profile name).

use std::collections::BTreeMap;
use std::fmt;

use minim_common::ContentHash;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A content-addressed cache key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(ContentHash);

impl CacheKey {
    /// Derives the key for a set of inputs.
    ///
    /// Every input is hashed as its own length-prefixed part, so no value can
    /// spill into its neighbour.
    pub fn derive(inputs: &CacheKeyInputs<'_>) -> Self {
        let source_hash = ContentHash::from_bytes(inputs.source.as_bytes()).to_string();
        let mut options = String::new();
        write_canonical(inputs.options, &mut options);
        let source_map = if inputs.source_map { "1" } else { "0" };
        let extra_count = inputs.extra.len().to_string();

        let mut parts: Vec<&str> = vec![
            source_hash.as_str(),
            options.as_str(),
            inputs.minifier_name,
            inputs.minifier_version,
            inputs.tool_version,
            source_map,
            extra_count.as_str(),
        ];
        for (k, v) in &inputs.extra {
            parts.push(k.as_str());
            parts.push(v.as_str());
        }

        Self(ContentHash::from_parts(parts.into_iter().map(str::as_bytes)))
    }

    /// Parses a key from its hex form, as used in artifact file names.
    pub fn from_hex(s: &str) -> Option<Self> {
        ContentHash::from_hex(s).map(Self)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.0)
    }
}

/// Everything a [`CacheKey`] is derived from.
#[derive(Debug, Clone)]
pub struct CacheKeyInputs<'a> {
    /// The asset's source text.
    pub source: &'a str,
    /// The effective minifier options.
    pub options: &'a Value,
    /// The minifier's name.
    pub minifier_name: &'a str,
    /// The minifier's version.
    pub minifier_version: &'a str,
    /// This pipeline's version.
    pub tool_version: &'a str,
    /// Whether a source map was requested.
    pub source_map: bool,
    /// Additional caller-provided key material.
    pub extra: BTreeMap<String, String>,
}

/// Writes `value` as JSON with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
