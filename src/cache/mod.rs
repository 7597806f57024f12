//! Cache Module
//!
//! Storage, statistics, TTL resolution and the loader capability behind
//! [`FetchCache`](crate::FetchCache).

mod entry;
mod loader;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::CacheEntry;
pub use loader::Loader;
pub use stats::CacheStats;
pub use store::{CacheStore, SweepReport};
pub use ttl::{parse_duration, TtlResolver, FALLBACK_TTL};
