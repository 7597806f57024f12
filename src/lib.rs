//! Fetch Cache - A process-local read-through cache
//!
//! Sits in front of an expensive fetch: the first lookup of a key runs the
//! loader and stores its payload, later lookups are served from memory until a
//! background janitor sweeps the entry out after its TTL.

pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod tasks;

pub use cache::{
    parse_duration, CacheEntry, CacheStats, Loader, SweepReport, TtlResolver, FALLBACK_TTL,
};
pub use config::{CacheConfig, LoggingConfig};
pub use error::ParseDurationError;
pub use lifecycle::FetchCache;
