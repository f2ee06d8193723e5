//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Reads are fail-safe and never produce these; a corrupt or missing entry
/// is a miss. Writes and maintenance report them, and callers treat them
/// as a degraded cache rather than a failed build.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The backing store cannot be used at all.
    #[error("cache unavailable: {reason}")]
    Unavailable {
        /// Why the store is unavailable.
        reason: String,
    },
}
