//! Cache Entry Module
//!
//! Defines a single cached payload together with its absolute expiry.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

// == Cache Entry ==
/// A fetched payload and the instant after which it becomes stale.
///
/// Entries are replaced wholesale on re-fill and never mutated in place.
/// Holding an entry says nothing about freshness: reads do not check expiry,
/// only a sweep removes stale entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The cached payload
    pub data: Bytes,
    /// Absolute expiry on the Tokio clock
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    pub fn new(data: Bytes, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    // == Is Expired ==
    /// Returns true if the expiry lies strictly before `now`.
    ///
    /// An entry whose expiry equals `now` is still considered live; it will be
    /// picked up by the following sweep.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at < now
    }

    /// Returns true if the entry is expired at the current instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
