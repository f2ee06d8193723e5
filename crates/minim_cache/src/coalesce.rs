//! At-most-one computation per key.
//!
//! [`CoalescingCache::get_or_compute`] is the only entry point the pipeline
//! uses. The first caller for a key becomes the leader and runs the
//! computation; concurrent callers for the same key block on the leader's
//! flight and receive its outcome. Successful results are written to the
//! backing store before the flight is retired, so a caller arriving later
//! sees either the flight or the stored entry, never neither.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::entry::CacheEntry;
use crate::key::CacheKey;
use crate::store::CacheStore;

/// How a [`Resolution`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The entry was already in the backing store.
    Hit,
    /// This caller ran the computation.
    Computed,
    /// Another caller was computing the same key; this caller waited for it.
    Joined,
}

/// The outcome of [`CoalescingCache::get_or_compute`].
#[derive(Debug, Clone)]
pub struct Resolution<E> {
    /// The entry, or the failure the computation produced.
    pub outcome: Result<Arc<CacheEntry>, E>,
    /// Where the outcome came from.
    pub lookup: Lookup,
}

enum FlightState<E> {
    Pending,
    Done(Result<Arc<CacheEntry>, E>),
    /// The leader unwound without finishing; waiters retry.
    Abandoned,
}

struct Flight<E> {
    state: Mutex<FlightState<E>>,
    ready: Condvar,
}

impl<E> Flight<E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Pending),
            ready: Condvar::new(),
        }
    }
}

/// Deduplicates concurrent computations in front of an optional store.
///
/// Without a store, concurrent callers are still coalesced, but nothing is
/// remembered once the flight completes.
pub struct CoalescingCache<E> {
    store: Option<Arc<dyn CacheStore>>,
    in_flight: Mutex<HashMap<CacheKey, Arc<Flight<E>>>>,
}

impl<E: Clone> CoalescingCache<E> {
    /// Creates a coalescing layer over `store`.
    pub fn new(store: Option<Arc<dyn CacheStore>>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The backing store, if any.
    pub fn store(&self) -> Option<&Arc<dyn CacheStore>> {
        self.store.as_ref()
    }

    /// Returns the entry for `key`, running `compute` only if no stored
    /// entry exists and no other caller is already computing it.
    ///
    /// Failures are shared with callers that joined the flight but are never
    /// stored, so the next build retries them.
    pub fn get_or_compute<F>(&self, key: &CacheKey, compute: F) -> Resolution<E>
    where
        F: FnOnce() -> Result<CacheEntry, E>,
    {
        let flight = loop {
            if let Some(entry) = self.get(key) {
                return Resolution {
                    outcome: Ok(entry),
                    lookup: Lookup::Hit,
                };
            }

            let (flight, leader) = {
                let mut in_flight = self.in_flight.lock();
                match in_flight.get(key) {
                    Some(flight) => (Arc::clone(flight), false),
                    None => {
                        let flight = Arc::new(Flight::new());
                        in_flight.insert(*key, Arc::clone(&flight));
                        (flight, true)
                    }
                }
            };

            if leader {
                break flight;
            }

            let mut state = flight.state.lock();
            while matches!(*state, FlightState::Pending) {
                flight.ready.wait(&mut state);
            }
            if let FlightState::Done(outcome) = &*state {
                return Resolution {
                    outcome: outcome.clone(),
                    lookup: Lookup::Joined,
                };
            }
            // Abandoned: race for leadership again.
        };

        let mut guard = LeaderGuard {
            cache: self,
            key: *key,
            flight,
            finished: false,
        };

        // A previous leader may have stored the entry between our lookup
        // and our registration.
        if let Some(entry) = self.get(key) {
            guard.finish(Ok(Arc::clone(&entry)));
            return Resolution {
                outcome: Ok(entry),
                lookup: Lookup::Hit,
            };
        }

        let outcome = compute().map(Arc::new);
        if let Ok(entry) = &outcome {
            self.store_entry(key, entry);
        }
        guard.finish(outcome.clone());
        Resolution {
            outcome,
            lookup: Lookup::Computed,
        }
    }

    /// Reads the backing store without computing.
    ///
    /// A store error is logged and reads as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    fn store_entry(&self, key: &CacheKey, entry: &Arc<CacheEntry>) {
        if let Some(store) = &self.store {
            if let Err(e) = store.set(key, Arc::clone(entry)) {
                tracing::warn!(%key, error = %e, "cache write failed, entry not stored");
            }
        }
    }
}

/// Retires the leader's flight, marking it abandoned if the leader unwinds.
struct LeaderGuard<'a, E> {
    cache: &'a CoalescingCache<E>,
    key: CacheKey,
    flight: Arc<Flight<E>>,
    finished: bool,
}

impl<E> LeaderGuard<'_, E> {
    fn finish(&mut self, outcome: Result<Arc<CacheEntry>, E>) {
        self.settle(FlightState::Done(outcome));
    }

    fn settle(&mut self, state: FlightState<E>) {
        *self.flight.state.lock() = state;
        self.cache.in_flight.lock().remove(&self.key);
        self.flight.ready.notify_all();
        self.finished = true;
    }
}

impl<E> Drop for LeaderGuard<'_, E> {
    fn drop(&mut self) {
        if !self.finished {
            self.settle(FlightState::Abandoned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CacheKeyInputs;
    use crate::store::MemoryCache;
    use crate::CacheError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn key_for(source: &str) -> CacheKey {
        let options = json!({});
        CacheKey::derive(&CacheKeyInputs {
            source,
            options: &options,
            minifier_name: "fake",
            minifier_version: "1.0.0",
            tool_version: "0.1.0",
            source_map: false,
            extra: Default::default(),
        })
    }

    fn memory() -> (Arc<MemoryCache>, CoalescingCache<String>) {
        let store = Arc::new(MemoryCache::new());
        let cache = CoalescingCache::new(Some(Arc::clone(&store) as Arc<dyn CacheStore>));
        (store, cache)
    }

    #[test]
    fn miss_computes_and_stores() {
        let (store, cache) = memory();
        let key = key_for("a");

        let res = cache.get_or_compute(&key, || Ok(CacheEntry::new("min")));
        assert_eq!(res.lookup, Lookup::Computed);
        assert_eq!(res.outcome.unwrap().code, "min");
        assert!(store.has(&key).unwrap());
    }

    #[test]
    fn second_call_hits() {
        let (_store, cache) = memory();
        let key = key_for("a");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache.get_or_compute(&key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(CacheEntry::new("min"))
            });
        }
        let res = cache.get_or_compute(&key, || Err("unused".to_string()));
        assert_eq!(res.lookup, Lookup::Hit);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_are_not_stored() {
        let (store, cache) = memory();
        let key = key_for("bad");

        let res = cache.get_or_compute(&key, || Err("boom".to_string()));
        assert_eq!(res.outcome.unwrap_err(), "boom");
        assert!(store.is_empty());

        let res = cache.get_or_compute(&key, || Ok(CacheEntry::new("ok")));
        assert_eq!(res.lookup, Lookup::Computed);
    }

    #[test]
    fn concurrent_requests_compute_once() {
        let (_store, cache) = memory();
        let key = key_for("shared");
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        let lookups: Vec<Lookup> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        let res = cache.get_or_compute(&key, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(50));
                            Ok(CacheEntry::new("once"))
                        });
                        assert_eq!(res.outcome.unwrap().code, "once");
                        res.lookup
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lookups.iter().filter(|l| **l == Lookup::Computed).count(), 1);
    }

    #[test]
    fn concurrent_failure_is_shared_without_store() {
        let cache: CoalescingCache<String> = CoalescingCache::new(None);
        let key = key_for("shared");
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(4);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    barrier.wait();
                    let res = cache.get_or_compute(&key, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(50));
                        Err("syntax error".to_string())
                    });
                    assert_eq!(res.outcome.unwrap_err(), "syntax error");
                });
            }
        });

        // Each caller either led a flight or joined one; with the sleep
        // holding the first flight open, at most a straggler recomputes.
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert!(cache.in_flight.lock().is_empty());
    }

    #[test]
    fn panicking_leader_lets_waiters_retry() {
        let (_store, cache) = memory();
        let key = key_for("p");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_compute(&key, || -> Result<CacheEntry, String> {
                panic!("minifier crashed")
            })
        }));
        assert!(result.is_err());
        assert!(cache.in_flight.lock().is_empty());

        let res = cache.get_or_compute(&key, || Ok(CacheEntry::new("recovered")));
        assert_eq!(res.lookup, Lookup::Computed);
        assert_eq!(res.outcome.unwrap().code, "recovered");
    }

    #[test]
    fn store_errors_degrade_to_compute() {
        struct Broken;
        impl CacheStore for Broken {
            fn get(&self, _: &CacheKey) -> Result<Option<Arc<CacheEntry>>, CacheError> {
                Err(CacheError::Unavailable {
                    reason: "disk gone".into(),
                })
            }
            fn set(&self, _: &CacheKey, _: Arc<CacheEntry>) -> Result<(), CacheError> {
                Err(CacheError::Unavailable {
                    reason: "disk gone".into(),
                })
            }
        }

        let cache: CoalescingCache<String> = CoalescingCache::new(Some(Arc::new(Broken)));
        let res = cache.get_or_compute(&key_for("a"), || Ok(CacheEntry::new("min")));
        assert_eq!(res.lookup, Lookup::Computed);
        assert_eq!(res.outcome.unwrap().code, "min");
    }
}
