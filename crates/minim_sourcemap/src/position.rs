//! Original-source locations resolved through a source map.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A generated position resolved back to its original source.
///
/// Lines are 1-indexed and columns 0-indexed, as source-map consumers report them.
/// Produced by [`SourceMap::original_position_for`](crate::SourceMap::original_position_for).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalPosition {
    /// The original source, joined with the map's `sourceRoot`.
    pub source: String,
    /// The line number in the original source (1-indexed).
    pub line: u32,
    /// The column number in the original source (0-indexed).
    pub column: u32,
    /// The original identifier at this position, if the map records one.
    pub name: Option<String>,
}

impl fmt::Display for OriginalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.source, self.line, self.column)
    }
}
