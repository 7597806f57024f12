//! Cache Store Module
//!
//! Concurrent key/entry storage shared by the fill path and the janitor.

use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats};

// == Sweep Report ==
/// Outcome of one pass over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries examined during the pass, including the removed ones
    pub visited: usize,
    /// Entries removed because their expiry had passed
    pub removed: usize,
}

// == Cache Store ==
/// Concurrent map from keys to cached entries.
///
/// Every method takes `&self`; the map is sharded internally, so callers may
/// load, store, delete and sweep from any number of tasks without extra locking.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-entry storage
    entries: DashMap<String, CacheEntry>,
    /// Activity counters
    stats: StatsCounters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the payload stored under `key`, counting a hit or a miss.
    ///
    /// Expiry is deliberately not checked here; stale entries are served until a
    /// sweep removes them.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        // Clone out so the shard guard is released before returning
        let data = self.entries.get(key).map(|entry| entry.data.clone());
        if data.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        data
    }

    // == Peek ==
    /// Returns a copy of the entry under `key` without touching the counters.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    // == Insert ==
    /// Stores freshly loaded data under `key`, expiring `ttl` from now.
    ///
    /// An existing entry is overwritten; concurrent fills of the same key are
    /// last-write-wins.
    pub fn insert(&self, key: impl Into<String>, data: Bytes, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(data, ttl));
        self.stats.record_fill();
    }

    /// Stores a prebuilt entry as-is.
    pub fn insert_entry(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    // == Remove ==
    /// Removes and returns the entry under `key`.
    pub fn remove(&self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    /// Counts a loader failure against this store.
    pub fn record_fetch_failure(&self) {
        self.stats.record_fetch_failure();
    }

    // == Purge Expired ==
    /// Removes every entry whose expiry lies strictly before the start of the pass.
    pub fn purge_expired(&self) -> SweepReport {
        let now = Instant::now();
        let mut report = SweepReport::default();

        self.entries.retain(|_, entry| {
            report.visited += 1;
            let expired = entry.is_expired_at(now);
            if expired {
                report.removed += 1;
            }
            !expired
        });

        self.stats.record_sweep(report.removed);
        report
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
