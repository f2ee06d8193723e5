//! The canonical, immutable source map representation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mappings::{Mappings, SourceRef};
use crate::position::OriginalPosition;

fn default_version() -> u32 {
    3
}

/// The serialized (JSON) shape of a version 3 source map.
///
/// Fields other than the standard ones are kept in `extensions` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    /// Format version. Defaults to 3 when absent.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Name of the generated file this map describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Prefix joined onto every entry of `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// Original source names, indexed by mapping segments.
    pub sources: Vec<String>,
    /// Inline contents of the original sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Identifier names, indexed by mapping segments.
    #[serde(default)]
    pub names: Vec<String>,
    /// Base64 VLQ encoded mapping table.
    pub mappings: String,
    /// Any non-standard fields (e.g. `x_google_ignoreList`).
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

#[derive(Debug)]
struct Inner {
    raw: RawSourceMap,
    mappings: Mappings,
}

/// A validated source map with a decoded mapping table.
///
/// Cloning is cheap: the data is shared behind an [`Arc`] and never mutated.
#[derive(Debug, Clone)]
pub struct SourceMap {
    inner: Arc<Inner>,
}

impl SourceMap {
    /// Validates a raw map and decodes its mappings.
    ///
    /// Returns `None` if the mappings fail to decode or reference a source or
    /// name index that does not exist.
    pub fn from_raw(raw: RawSourceMap) -> Option<Self> {
        let mappings = Mappings::parse(&raw.mappings).ok()?;
        if !indices_in_bounds(&mappings, &raw) {
            return None;
        }
        Some(Self {
            inner: Arc::new(Inner { raw, mappings }),
        })
    }

    /// Builds a map from already-decoded mappings, encoding them into `raw`.
    pub(crate) fn from_decoded(mut raw: RawSourceMap, mappings: Mappings) -> Self {
        raw.mappings = mappings.encode();
        Self {
            inner: Arc::new(Inner { raw, mappings }),
        }
    }

    /// Returns the serializable form of this map.
    pub fn raw(&self) -> &RawSourceMap {
        &self.inner.raw
    }

    /// Returns the decoded mapping table.
    pub fn mappings(&self) -> &Mappings {
        &self.inner.mappings
    }

    /// Returns the `file` field, if present.
    pub fn file(&self) -> Option<&str> {
        self.inner.raw.file.as_deref()
    }

    /// Returns the `sourceRoot` field, if present.
    pub fn source_root(&self) -> Option<&str> {
        self.inner.raw.source_root.as_deref()
    }

    /// Returns the raw `sources` entries (without `sourceRoot` applied).
    pub fn sources(&self) -> &[String] {
        &self.inner.raw.sources
    }

    /// Returns the source at `index` joined with `sourceRoot`.
    pub fn resolved_source(&self, index: u32) -> Option<String> {
        let source = self.inner.raw.sources.get(index as usize)?;
        Some(join_source_root(self.source_root(), source))
    }

    /// Resolves a generated position to the original source.
    ///
    /// `line` is 1-based and `column` 0-based, the convention minifiers report
    /// positions in. Returns `None` for line 0, when no segment starts at or
    /// before the position, or when the covering segment has no source.
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        let line = line.checked_sub(1)?;
        let segment = self.inner.mappings.lookup(line, column)?;
        let src = segment.source?;
        self.position_of(src)
    }

    fn position_of(&self, src: SourceRef) -> Option<OriginalPosition> {
        Some(OriginalPosition {
            source: self.resolved_source(src.source)?,
            line: src.line + 1,
            column: src.column,
            name: src
                .name
                .and_then(|n| self.inner.raw.names.get(n as usize).cloned()),
        })
    }

    /// Returns a copy whose generated lines are pushed down by `lines`.
    pub fn with_line_offset(&self, lines: usize) -> Self {
        if lines == 0 {
            return self.clone();
        }
        Self::from_decoded(self.inner.raw.clone(), self.inner.mappings.shifted(lines))
    }

    /// Serializes the map into a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.inner.raw)
    }

    /// Serializes the map into a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.inner.raw)
    }
}

impl PartialEq for SourceMap {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.raw == other.inner.raw
    }
}

fn indices_in_bounds(mappings: &Mappings, raw: &RawSourceMap) -> bool {
    mappings.source_refs().all(|src| {
        (src.source as usize) < raw.sources.len()
            && src.name.map_or(true, |n| (n as usize) < raw.names.len())
    })
}

/// Joins `sourceRoot` onto a source entry.
///
/// Absolute paths and URLs are returned unchanged.
pub(crate) fn join_source_root(root: Option<&str>, source: &str) -> String {
    match root {
        None | Some("") => source.to_string(),
        Some(_) if source.starts_with('/') || source.contains("://") => source.to_string(),
        Some(root) if root.ends_with('/') => format!("{root}{source}"),
        Some(root) => format!("{root}/{source}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SourceMap {
        let raw: RawSourceMap = serde_json::from_value(json!({
            "version": 3,
            "file": "test.js",
            "names": ["bar", "baz", "n"],
            "sources": ["one.js", "two.js"],
            "sourceRoot": "http://example.com/www/js/",
            "mappings": "CAAC,IAAI,IAAM,SAAUA,GAClB,OAAOC,IAAID;CCDb,IAAI,IAAM,SAAUE,GAClB,OAAOA"
        }))
        .unwrap();
        SourceMap::from_raw(raw).unwrap()
    }

    #[test]
    fn resolves_first_line_to_one_js() {
        let map = sample();
        let pos = map.original_position_for(1, 1).unwrap();
        assert_eq!(pos.source, "http://example.com/www/js/one.js");
        assert_eq!((pos.line, pos.column), (1, 1));
        assert_eq!(pos.name, None);
    }

    #[test]
    fn resolves_second_line_to_two_js() {
        let map = sample();
        let pos = map.original_position_for(2, 2).unwrap();
        assert_eq!(pos.source, "http://example.com/www/js/two.js");
    }

    #[test]
    fn resolves_name() {
        let map = sample();
        // generated column 18 carries name index 0
        let pos = map.original_position_for(1, 18).unwrap();
        assert_eq!(pos.name.as_deref(), Some("bar"));
    }

    #[test]
    fn uncovered_positions_unresolved() {
        let map = sample();
        assert!(map.original_position_for(0, 1).is_none());
        // line 1 starts mapping at column 1
        assert!(map.original_position_for(1, 0).is_none());
        assert!(map.original_position_for(3, 1).is_none());
    }

    #[test]
    fn column_before_late_first_segment_unresolved() {
        let raw: RawSourceMap = serde_json::from_value(json!({
            "sources": ["a.js"],
            "mappings": "UAAA"
        }))
        .unwrap();
        let map = SourceMap::from_raw(raw).unwrap();
        assert!(map.original_position_for(1, 1).is_none());
        assert!(map.original_position_for(1, 9).is_none());
        let pos = map.original_position_for(1, 10).unwrap();
        assert_eq!((pos.source.as_str(), pos.line, pos.column), ("a.js", 1, 0));
    }

    #[test]
    fn out_of_bounds_source_rejected() {
        let raw: RawSourceMap = serde_json::from_value(json!({
            "version": 3,
            "sources": [],
            "mappings": "AAAA"
        }))
        .unwrap();
        assert!(SourceMap::from_raw(raw).is_none());
    }

    #[test]
    fn extensions_preserved() {
        let raw: RawSourceMap = serde_json::from_value(json!({
            "version": 3,
            "sources": ["a.js"],
            "mappings": "AAAA",
            "x_google_ignoreList": [0]
        }))
        .unwrap();
        let map = SourceMap::from_raw(raw).unwrap();
        let value = map.to_value().unwrap();
        assert_eq!(value["x_google_ignoreList"], json!([0]));
    }

    #[test]
    fn join_source_root_variants() {
        assert_eq!(join_source_root(None, "a.js"), "a.js");
        assert_eq!(join_source_root(Some(""), "a.js"), "a.js");
        assert_eq!(join_source_root(Some("src"), "a.js"), "src/a.js");
        assert_eq!(join_source_root(Some("src/"), "a.js"), "src/a.js");
        assert_eq!(join_source_root(Some("src"), "/abs/a.js"), "/abs/a.js");
        assert_eq!(
            join_source_root(Some("src"), "webpack://app/a.js"),
            "webpack://app/a.js"
        );
    }

    #[test]
    fn line_offset_shifts_lookup() {
        let map = sample().with_line_offset(1);
        assert!(map.original_position_for(1, 2).is_none());
        assert_eq!(
            map.original_position_for(2, 2).unwrap().source,
            "http://example.com/www/js/one.js"
        );
    }
}
