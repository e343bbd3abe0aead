//! Single-flight memoization store
//!
//! Each key is either `Ready` (value stored) or `Pending` (one caller is
//! computing it). Callers that find a pending slot park on the flight's
//! condvar and receive the leader's result, success or failure. Failures
//! are never stored: the slot is removed and the next caller computes again.
//!
//! The map lock is only held for lookups and slot transitions, never while
//! a computation runs, so distinct keys do not block each other.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::trace;

use crate::key::CacheKey;
use crate::stats::CacheStats;

enum Slot<V, E> {
    Ready(V),
    Pending(Arc<Flight<V, E>>),
}

#[derive(Clone)]
enum Outcome<V, E> {
    Finished(Result<V, E>),
    /// The leader unwound without a result; waiters retry
    Abandoned,
}

/// One in-progress computation
struct Flight<V, E> {
    outcome: Mutex<Option<Outcome<V, E>>>,
    done: Condvar,
}

impl<V: Clone, E: Clone> Flight<V, E> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn finish(&self, outcome: Outcome<V, E>) {
        *self.outcome.lock() = Some(outcome);
        self.done.notify_all();
    }

    fn wait(&self) -> Outcome<V, E> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(o) = outcome.as_ref() {
                return o.clone();
            }
            self.done.wait(&mut outcome);
        }
    }
}

enum Lookup<V, E> {
    Hit(V),
    Wait(Arc<Flight<V, E>>),
    Lead(Arc<Flight<V, E>>),
}

/// Settles the flight as abandoned if the leader unwinds
struct LeaderGuard<'a, V: Clone, E: Clone> {
    store: &'a MemoStore<V, E>,
    key: &'a CacheKey,
    flight: &'a Arc<Flight<V, E>>,
    settled: bool,
}

impl<V: Clone, E: Clone> Drop for LeaderGuard<'_, V, E> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.settle(self.key, self.flight, Outcome::Abandoned);
        }
    }
}

/// Unbounded in-memory memoization store with single-flight computation
///
/// There is no eviction and no size bound: entries live until
/// [`MemoStore::clear`] or until the store is dropped.
pub struct MemoStore<V, E> {
    slots: RwLock<HashMap<CacheKey, Slot<V, E>, RandomState>>,
    stats: CacheStats,
}

impl<V: Clone, E: Clone> Default for MemoStore<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, E: Clone> MemoStore<V, E> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::with_hasher(RandomState::new())),
            stats: CacheStats::new(),
        }
    }

    /// Return the stored value for `key`, or run `compute` to produce it
    ///
    /// At most one `compute` runs per key at a time. Concurrent callers for
    /// the same key wait for it and get a clone of its result. An `Err` is
    /// handed to the waiters but not stored.
    ///
    /// # Arguments
    /// * `key` - Operation name and argument snapshot
    /// * `compute` - Produces the value on a miss
    ///
    /// # Returns
    /// * `Result<V, E>` - Stored, shared or freshly computed outcome
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let flight = loop {
            match self.lookup(&key) {
                Lookup::Hit(value) => {
                    self.stats.record_hit();
                    trace!("hit {}", key);
                    return Ok(value);
                }
                Lookup::Wait(flight) => {
                    self.stats.record_coalesced();
                    trace!("waiting on in-flight {}", key);
                    match flight.wait() {
                        Outcome::Finished(result) => return result,
                        Outcome::Abandoned => continue,
                    }
                }
                Lookup::Lead(flight) => break flight,
            }
        };

        self.stats.record_miss();
        trace!("miss {}", key);

        let mut guard = LeaderGuard {
            store: self,
            key: &key,
            flight: &flight,
            settled: false,
        };
        let result = compute();
        guard.settled = true;

        if result.is_err() {
            self.stats.record_failure();
        }
        self.settle(&key, &flight, Outcome::Finished(result.clone()));
        result
    }

    /// Get a stored value without computing
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        match self.slots.read().get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Number of stored values (in-flight keys excluded)
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Check if no value is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored value and reset statistics
    ///
    /// Flights in progress are left alone and still store their result.
    pub fn clear(&self) {
        self.slots
            .write()
            .retain(|_, slot| matches!(slot, Slot::Pending(_)));
        self.stats.reset();
    }

    /// Get store statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn lookup(&self, key: &CacheKey) -> Lookup<V, E> {
        // Try the shared lock first
        {
            let slots = self.slots.read();
            match slots.get(key) {
                Some(Slot::Ready(value)) => return Lookup::Hit(value.clone()),
                Some(Slot::Pending(flight)) => return Lookup::Wait(Arc::clone(flight)),
                None => {}
            }
        }

        // Re-check under the exclusive lock, another caller may have won
        let mut slots = self.slots.write();
        match slots.entry(key.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(value) => Lookup::Hit(value.clone()),
                Slot::Pending(flight) => Lookup::Wait(Arc::clone(flight)),
            },
            Entry::Vacant(entry) => {
                let flight = Arc::new(Flight::new());
                entry.insert(Slot::Pending(Arc::clone(&flight)));
                Lookup::Lead(flight)
            }
        }
    }

    fn settle(&self, key: &CacheKey, flight: &Arc<Flight<V, E>>, outcome: Outcome<V, E>) {
        {
            let mut slots = self.slots.write();
            let ours = matches!(
                slots.get(key),
                Some(Slot::Pending(pending)) if Arc::ptr_eq(pending, flight)
            );
            if ours {
                match &outcome {
                    Outcome::Finished(Ok(value)) => {
                        slots.insert(key.clone(), Slot::Ready(value.clone()));
                        self.stats.record_insert();
                    }
                    _ => {
                        slots.remove(key);
                    }
                }
            }
        }
        flight.finish(outcome);
    }
}
