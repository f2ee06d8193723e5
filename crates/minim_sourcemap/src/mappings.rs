//! Decoded mapping tables and generated-position lookup.
//!
//! All positions in this module are 0-based, as they are in the encoded
//! `mappings` string. [`SourceMap`](crate::SourceMap) takes and reports
//! 1-based lines.

use crate::vlq;

/// Errors produced while decoding a `mappings` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingsError {
    /// A segment contained an invalid base64 VLQ sequence.
    #[error("invalid VLQ data in segment {segment:?} on line {line}")]
    InvalidVlq {
        /// 0-based generated line of the segment.
        line: usize,
        /// The offending segment text.
        segment: String,
    },

    /// A segment had a field count other than 1, 4, or 5.
    #[error("segment on line {line} has {fields} fields, expected 1, 4 or 5")]
    FieldCount {
        /// 0-based generated line of the segment.
        line: usize,
        /// Number of fields found.
        fields: usize,
    },

    /// A decoded position or index went negative.
    #[error("negative value in segment on line {line}")]
    Negative {
        /// 0-based generated line of the segment.
        line: usize,
    },
}

/// The original-source half of a mapping segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRef {
    /// Index into the map's `sources`.
    pub source: u32,
    /// 0-based line in the original source.
    pub line: u32,
    /// 0-based column in the original source.
    pub column: u32,
    /// Index into the map's `names`, if the segment carries one.
    pub name: Option<u32>,
}

/// A single mapping segment on a generated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// 0-based column in the generated output.
    pub generated_column: u32,
    /// Where the generated column came from, or `None` for an unmapped span.
    pub source: Option<SourceRef>,
}

/// A fully decoded mapping table, one segment list per generated line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mappings {
    lines: Vec<Vec<Segment>>,
}

impl Mappings {
    /// Builds a table from already-decoded lines.
    ///
    /// Segments within each line are sorted by generated column.
    pub fn from_lines(mut lines: Vec<Vec<Segment>>) -> Self {
        for line in &mut lines {
            line.sort_by_key(|s| s.generated_column);
        }
        Self { lines }
    }

    /// Decodes a `mappings` string.
    pub fn parse(encoded: &str) -> Result<Self, MappingsError> {
        let mut lines = Vec::new();
        let mut source: i64 = 0;
        let mut original_line: i64 = 0;
        let mut original_column: i64 = 0;
        let mut name: i64 = 0;

        if encoded.is_empty() {
            return Ok(Self::default());
        }

        for (line_idx, line) in encoded.split(';').enumerate() {
            let mut segments = Vec::new();
            let mut generated_column: i64 = 0;

            for text in line.split(',').filter(|s| !s.is_empty()) {
                let fields = vlq::decode_segment(text).ok_or_else(|| MappingsError::InvalidVlq {
                    line: line_idx,
                    segment: text.to_string(),
                })?;

                generated_column += fields[0];
                let source_ref = match fields.len() {
                    1 => None,
                    4 | 5 => {
                        source += fields[1];
                        original_line += fields[2];
                        original_column += fields[3];
                        let name_idx = if fields.len() == 5 {
                            name += fields[4];
                            Some(to_u32(name, line_idx)?)
                        } else {
                            None
                        };
                        Some(SourceRef {
                            source: to_u32(source, line_idx)?,
                            line: to_u32(original_line, line_idx)?,
                            column: to_u32(original_column, line_idx)?,
                            name: name_idx,
                        })
                    }
                    n => {
                        return Err(MappingsError::FieldCount {
                            line: line_idx,
                            fields: n,
                        })
                    }
                };

                segments.push(Segment {
                    generated_column: to_u32(generated_column, line_idx)?,
                    source: source_ref,
                });
            }
            lines.push(segments);
        }

        Ok(Self::from_lines(lines))
    }

    /// Encodes the table back into a `mappings` string.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let mut prev_source: i64 = 0;
        let mut prev_line: i64 = 0;
        let mut prev_column: i64 = 0;
        let mut prev_name: i64 = 0;

        for (line_idx, line) in self.lines.iter().enumerate() {
            if line_idx > 0 {
                out.push(';');
            }
            let mut prev_generated: i64 = 0;
            for (seg_idx, seg) in line.iter().enumerate() {
                if seg_idx > 0 {
                    out.push(',');
                }
                let generated = i64::from(seg.generated_column);
                vlq::encode_value(generated - prev_generated, &mut out);
                prev_generated = generated;

                if let Some(src) = seg.source {
                    let source = i64::from(src.source);
                    let line = i64::from(src.line);
                    let column = i64::from(src.column);
                    vlq::encode_value(source - prev_source, &mut out);
                    vlq::encode_value(line - prev_line, &mut out);
                    vlq::encode_value(column - prev_column, &mut out);
                    prev_source = source;
                    prev_line = line;
                    prev_column = column;
                    if let Some(name) = src.name {
                        let name = i64::from(name);
                        vlq::encode_value(name - prev_name, &mut out);
                        prev_name = name;
                    }
                }
            }
        }
        out
    }

    /// Returns the decoded lines.
    pub fn lines(&self) -> &[Vec<Segment>] {
        &self.lines
    }

    /// Iterates over every segment that references an original source.
    pub fn source_refs(&self) -> impl Iterator<Item = SourceRef> + '_ {
        self.lines.iter().flatten().filter_map(|s| s.source)
    }

    /// Finds the segment covering a generated position.
    ///
    /// Picks the last segment whose generated column is at or before `column`.
    /// Returns `None` when no segment on the line starts at or before it.
    pub fn lookup(&self, line: u32, column: u32) -> Option<&Segment> {
        let segments = self.lines.get(line as usize)?;
        let idx = segments.partition_point(|s| s.generated_column <= column);
        idx.checked_sub(1).and_then(|i| segments.get(i))
    }

    /// Returns a copy with `count` empty lines prepended.
    ///
    /// Used when text is inserted above the generated code.
    pub fn shifted(&self, count: usize) -> Self {
        let mut lines = Vec::with_capacity(self.lines.len() + count);
        lines.resize_with(count, Vec::new);
        lines.extend(self.lines.iter().cloned());
        Self { lines }
    }
}

fn to_u32(value: i64, line: usize) -> Result<u32, MappingsError> {
    u32::try_from(value).map_err(|_| MappingsError::Negative { line })
}
