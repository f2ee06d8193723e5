//! Composition of an upstream map with a minifier's output map.

use std::collections::{BTreeMap, HashMap};

use crate::map::{RawSourceMap, SourceMap};
use crate::mappings::{Mappings, Segment, SourceRef};

/// Chains two maps into one that points from minified output to original sources.
///
/// `original` maps original sources to the pre-minification asset; `minified`
/// maps that asset to the minifier's output. Every segment of `minified` is
/// traced through `original`; segments that land on an unmapped position
/// become unmapped segments in the result.
///
/// The result keeps `original`'s sources, `sourceRoot` and `sourcesContent`
/// and takes `file` from `minified`. Names prefer the original map's name and
/// fall back to the minifier's.
pub fn compose(original: &SourceMap, minified: &SourceMap) -> SourceMap {
    let mut names = NameTable::default();
    let mut lines = Vec::with_capacity(minified.mappings().lines().len());

    for line in minified.mappings().lines() {
        let mut out: Vec<Segment> = Vec::with_capacity(line.len());
        for seg in line {
            let traced = seg.source.and_then(|via| {
                let upstream = original.mappings().lookup(via.line, via.column)?;
                let src = upstream.source?;
                let name = src
                    .name
                    .and_then(|n| original.raw().names.get(n as usize))
                    .or_else(|| via.name.and_then(|n| minified.raw().names.get(n as usize)))
                    .map(|n| names.intern(n));
                Some(SourceRef {
                    source: src.source,
                    line: src.line,
                    column: src.column,
                    name,
                })
            });

            // Consecutive unmapped segments carry no information.
            if traced.is_none() && out.last().map_or(true, |s| s.source.is_none()) {
                continue;
            }
            out.push(Segment {
                generated_column: seg.generated_column,
                source: traced,
            });
        }
        lines.push(out);
    }

    let upstream = original.raw();
    let raw = RawSourceMap {
        version: 3,
        file: minified.file().map(str::to_string),
        source_root: upstream.source_root.clone(),
        sources: upstream.sources.clone(),
        sources_content: upstream.sources_content.clone(),
        names: names.into_names(),
        mappings: String::new(),
        extensions: BTreeMap::new(),
    };
    SourceMap::from_decoded(raw, Mappings::from_lines(lines))
}

#[derive(Default)]
struct NameTable {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl NameTable {
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len() as u32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn into_names(self) -> Vec<String> {
        self.names
    }
}
