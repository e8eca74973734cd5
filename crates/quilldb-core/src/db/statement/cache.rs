//! Prepared-statement cache keyed by statement shape.
//!
//! Preparation costs a network round trip, so a shape is prepared at most
//! once per process under normal operation: concurrent misses for the same
//! shape coalesce onto a single preparer, and everyone else waits for its
//! result. Preparation failures are never cached.

use crate::{
    db::port::PreparedStatement,
    db::statement::{ShapeFingerprint, StatementShape},
    error::RuntimeError,
    obs::{self, MetricsEvent},
};
use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};
use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicU64, Ordering},
};

pub const DEFAULT_CACHE_CAPACITY: usize = 1_024;

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

struct CacheEntry {
    statement: Arc<PreparedStatement>,
    last_used: u64,
}

struct CacheState {
    entries: BTreeMap<StatementShape, CacheEntry>,
    tick: u64,
}

///
/// StatementCache
///
/// Long-lived, shared cache of prepared statements. Field-subset
/// combinations for partial reads and updates grow without bound over a
/// process lifetime, so entries above `capacity` are evicted
/// least-recently-used first.
///

pub struct StatementCache {
    state: Mutex<CacheState>,
    inflight: Mutex<BTreeSet<ShapeFingerprint>>,
    inflight_done: Condvar,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl StatementCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A zero capacity is clamped to one: a cache that cannot hold the entry
    /// it just prepared would defeat the contract.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: BTreeMap::new(),
                tick: 0,
            }),
            inflight: Mutex::new(BTreeSet::new()),
            inflight_done: Condvar::new(),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the cached statement for `shape`, or run `generator` to
    /// prepare one and cache it.
    ///
    /// The generator runs without any cache lock held; unrelated shapes are
    /// never serialized behind a slow prepare. A generator failure releases
    /// the shape's claim and propagates uncached, so a later call retries.
    pub fn get_or_prepare(
        &self,
        shape: &StatementShape,
        generator: impl FnOnce() -> Result<PreparedStatement, RuntimeError>,
    ) -> Result<Arc<PreparedStatement>, RuntimeError> {
        let fingerprint = shape.fingerprint();

        loop {
            if let Some(statement) = self.lookup(shape) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                obs::record(MetricsEvent::StatementCacheHit);
                return Ok(statement);
            }
            if self.try_claim(fingerprint) {
                break;
            }
            // Another thread is preparing this shape; wait for it and
            // re-check the cache.
            self.wait_for_preparer(fingerprint);
        }

        let claim = ClaimGuard {
            cache: self,
            fingerprint,
        };
        // The claim may have been won after a concurrent preparer finished;
        // re-check before paying for a duplicate round trip.
        if let Some(statement) = self.lookup(shape) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            obs::record(MetricsEvent::StatementCacheHit);
            drop(claim);
            return Ok(statement);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        obs::record(MetricsEvent::StatementCacheMiss);

        let statement = generator()?;
        let statement = self.insert(shape.clone(), statement);
        drop(claim);

        Ok(statement)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let size = self
            .state
            .lock()
            .expect("statement cache lock poisoned")
            .entries
            .len();

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry and zero the counters.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("statement cache lock poisoned");
        state.entries.clear();
        state.tick = 0;
        drop(state);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    fn lookup(&self, shape: &StatementShape) -> Option<Arc<PreparedStatement>> {
        let mut state = self.state.lock().expect("statement cache lock poisoned");
        state.tick += 1;
        let tick = state.tick;
        let entry = state.entries.get_mut(shape)?;
        entry.last_used = tick;

        Some(Arc::clone(&entry.statement))
    }

    fn insert(
        &self,
        shape: StatementShape,
        statement: PreparedStatement,
    ) -> Arc<PreparedStatement> {
        let statement = Arc::new(statement);
        let mut state = self.state.lock().expect("statement cache lock poisoned");
        state.tick += 1;
        let tick = state.tick;

        match state.entries.entry(shape) {
            // A racing preparer got here first; its statement is equivalent,
            // keep it and drop ours.
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().last_used = tick;
                Arc::clone(&occupied.get().statement)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    statement: Arc::clone(&statement),
                    last_used: tick,
                });
                self.evict_over_capacity(&mut state);
                statement
            }
        }
    }

    fn evict_over_capacity(&self, state: &mut CacheState) {
        while state.entries.len() > self.capacity {
            let victim = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(shape, _)| shape.clone());
            let Some(victim) = victim else {
                break;
            };
            state.entries.remove(&victim);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            obs::record(MetricsEvent::StatementCacheEviction);
        }
    }

    fn try_claim(&self, fingerprint: ShapeFingerprint) -> bool {
        self.inflight
            .lock()
            .expect("statement inflight lock poisoned")
            .insert(fingerprint)
    }

    fn wait_for_preparer(&self, fingerprint: ShapeFingerprint) {
        let mut inflight = self
            .inflight
            .lock()
            .expect("statement inflight lock poisoned");
        while inflight.contains(&fingerprint) {
            inflight = self
                .inflight_done
                .wait(inflight)
                .expect("statement inflight lock poisoned");
        }
    }
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases one in-flight claim, on success, failure, and unwind alike.
struct ClaimGuard<'a> {
    cache: &'a StatementCache,
    fingerprint: ShapeFingerprint,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        // A poisoned inflight lock means another preparer panicked while
        // holding it; waiters are already unblocked by that unwind.
        if let Ok(mut inflight) = self.cache.inflight.lock() {
            inflight.remove(&self.fingerprint);
            drop(inflight);
            self.cache.inflight_done.notify_all();
        }
    }
}
