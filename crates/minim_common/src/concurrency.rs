//! Hardware concurrency detection for sizing worker pools.

/// Fallback worker count when the platform cannot report its parallelism.
const FALLBACK_WORKERS: usize = 4;

/// Returns the number of execution units the host reports as available.
///
/// Never returns zero.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_WORKERS)
}
