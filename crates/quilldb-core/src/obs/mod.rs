//! Runtime instrumentation counters.
//!
//! Stats are best-effort only. Relaxed atomics are sufficient because the
//! counters are never used for correctness; they exist for endpoint/test
//! plumbing and operational visibility.

use std::sync::atomic::{AtomicU64, Ordering};

static CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static CACHE_MISSES: AtomicU64 = AtomicU64::new(0);
static CACHE_EVICTIONS: AtomicU64 = AtomicU64::new(0);
static SLICE_FETCHES: AtomicU64 = AtomicU64::new(0);
static SLICE_ROWS: AtomicU64 = AtomicU64::new(0);
static LWT_APPLIED: AtomicU64 = AtomicU64::new(0);
static LWT_REJECTED: AtomicU64 = AtomicU64::new(0);

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
#[remain::sorted]
pub enum MetricsEvent {
    LwtApplied,
    LwtRejected,
    SliceFetch { rows: u64 },
    StatementCacheEviction,
    StatementCacheHit,
    StatementCacheMiss,
}

pub(crate) fn record(event: MetricsEvent) {
    match event {
        MetricsEvent::LwtApplied => {
            LWT_APPLIED.fetch_add(1, Ordering::Relaxed);
        }
        MetricsEvent::LwtRejected => {
            LWT_REJECTED.fetch_add(1, Ordering::Relaxed);
        }
        MetricsEvent::SliceFetch { rows } => {
            SLICE_FETCHES.fetch_add(1, Ordering::Relaxed);
            SLICE_ROWS.fetch_add(rows, Ordering::Relaxed);
        }
        MetricsEvent::StatementCacheEviction => {
            CACHE_EVICTIONS.fetch_add(1, Ordering::Relaxed);
        }
        MetricsEvent::StatementCacheHit => {
            CACHE_HITS.fetch_add(1, Ordering::Relaxed);
        }
        MetricsEvent::StatementCacheMiss => {
            CACHE_MISSES.fetch_add(1, Ordering::Relaxed);
        }
    }
}

///
/// MetricsSnapshot
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    pub slice_fetches: u64,
    pub slice_rows: u64,
    pub lwt_applied: u64,
    pub lwt_rejected: u64,
}

/// Snapshot the current counters for endpoint/test plumbing.
#[must_use]
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        cache_hits: CACHE_HITS.load(Ordering::Relaxed),
        cache_misses: CACHE_MISSES.load(Ordering::Relaxed),
        cache_evictions: CACHE_EVICTIONS.load(Ordering::Relaxed),
        slice_fetches: SLICE_FETCHES.load(Ordering::Relaxed),
        slice_rows: SLICE_ROWS.load(Ordering::Relaxed),
        lwt_applied: LWT_APPLIED.load(Ordering::Relaxed),
        lwt_rejected: LWT_REJECTED.load(Ordering::Relaxed),
    }
}

/// Reset every counter to zero.
pub fn reset_all() {
    CACHE_HITS.store(0, Ordering::Relaxed);
    CACHE_MISSES.store(0, Ordering::Relaxed);
    CACHE_EVICTIONS.store(0, Ordering::Relaxed);
    SLICE_FETCHES.store(0, Ordering::Relaxed);
    SLICE_ROWS.store(0, Ordering::Relaxed);
    LWT_APPLIED.store(0, Ordering::Relaxed);
    LWT_REJECTED.store(0, Ordering::Relaxed);
}
