//! The minification pipeline.
//!
//! [`Orchestrator::run`] takes a host [`AssetSet`], selects the assets the
//! configured rules match, serves what it can from the cache, hands the rest
//! to a [`Minifier`] on a bounded [`WorkerPool`], merges source maps, and
//! writes the results back. Per-asset failures become diagnostics in the
//! returned [`BuildReport`]; they never abort the build.

#![warn(missing_docs)]

pub mod asset;
pub mod comments;
pub mod error;
pub mod filter;
pub mod minifier;
pub mod options;
pub mod orchestrator;
pub mod pool;
pub mod report;

pub use asset::{Asset, AssetSet, MemoryAssetSet};
pub use error::PipelineError;
pub use minifier::{Minifier, MinifyOutput};
pub use minim_config::Parallelism;
pub use options::{CommentExtraction, MinifyOptions};
pub use orchestrator::{CacheKeysHook, Orchestrator, WarningFilter, TOOL_VERSION};
pub use pool::{AbortHandle, TaskHandle, TaskId, TaskOutcome, WorkerPool};
pub use report::{BuildReport, BuildStats};
