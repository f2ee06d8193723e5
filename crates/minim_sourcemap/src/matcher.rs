//! Structural recognition of untyped source map values.

use serde_json::Value;

use crate::map::{RawSourceMap, SourceMap};

/// Returns `true` if `value` looks like a source map.
///
/// The test is structural: `value` must be an object whose `sources` is an
/// array and whose `mappings` is a string. `version` is not required.
pub fn is_source_map(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    matches!(obj.get("sources"), Some(Value::Array(_)))
        && matches!(obj.get("mappings"), Some(Value::String(_)))
}

/// Builds a canonical [`SourceMap`] from an untyped value.
///
/// Returns `None` for an absent value, for anything [`is_source_map`] rejects,
/// and for maps whose fields have the wrong element types or whose mappings
/// fail to decode.
pub fn build_source_map(raw: Option<&Value>) -> Option<SourceMap> {
    let value = raw?;
    if !is_source_map(value) {
        return None;
    }
    let raw: RawSourceMap = serde_json::from_value(value.clone()).ok()?;
    SourceMap::from_raw(raw)
}
