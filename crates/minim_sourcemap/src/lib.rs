//! Source map recognition, decoding, lookup, and composition.
//!
//! The [`is_source_map`] predicate and [`build_source_map`] constructor are the
//! only entry points for untyped JSON input: anything that fails them yields
//! `None` rather than an error. A built [`SourceMap`] is immutable and cheap to
//! clone, so it can be shared between worker threads and diagnostics.
//!
//! [`compose`] chains a pre-existing map (original sources to bundle) with the
//! minifier's map (bundle to minified output).

#![warn(missing_docs)]

pub mod compose;
pub mod map;
pub mod mappings;
pub mod matcher;
pub mod position;
pub mod vlq;

pub use compose::compose;
pub use map::{RawSourceMap, SourceMap};
pub use mappings::{Mappings, MappingsError, Segment, SourceRef};
pub use matcher::{build_source_map, is_source_map};
pub use position::OriginalPosition;
