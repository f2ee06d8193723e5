//! Content-addressed caching of minification results.
//!
//! A [`CacheKey`] is derived from everything that can change a minifier's
//! output. Entries live in a [`CacheStore`]: [`MemoryCache`] for a single
//! process, [`DiskCache`] for persistence across builds. [`CoalescingCache`]
//! sits in front of a store and guarantees that concurrent requests for the
//! same key run the computation once.

#![warn(missing_docs)]

pub mod artifact;
pub mod coalesce;
pub mod disk;
pub mod entry;
pub mod error;
pub mod key;
pub mod manifest;
pub mod store;

pub use coalesce::{CoalescingCache, Lookup, Resolution};
pub use disk::DiskCache;
pub use entry::CacheEntry;
pub use error::CacheError;
pub use key::{CacheKey, CacheKeyInputs};
pub use store::{CacheStore, MemoryCache};
