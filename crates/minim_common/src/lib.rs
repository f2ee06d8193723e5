//! Shared foundational types used across the minim minification pipeline.
//!
//! This crate provides content hashing for cache keys and artifact checksums,
//! and the hardware-concurrency helper used to size the worker pool.

#![warn(missing_docs)]

pub mod concurrency;
pub mod hash;

pub use concurrency::available_workers;
pub use hash::ContentHash;
