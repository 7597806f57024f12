//! Configuration Module
//!
//! Describes how a cache instance is switched on, how long its entries live and
//! whether the janitor reports its sweeps. Values can come from environment
//! variables or be deserialized as part of a host application's config file.

use std::env;

use serde::{Deserialize, Serialize};

/// Cache configuration passed to [`FetchCache::init`](crate::FetchCache::init).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether lookups go through the cache at all
    pub enabled: bool,
    /// Raw TTL string, e.g. `"2s"` or `"5m"`; resolved lazily
    pub ttl: String,
    /// Diagnostic logging of janitor sweeps
    pub logging: LoggingConfig,
}

/// Logging switches for the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Report the entry count after every janitor sweep
    pub enabled: bool,
}

impl CacheConfig {
    /// Creates an enabled configuration with the given TTL and logging off.
    pub fn enabled(ttl: impl Into<String>) -> Self {
        Self {
            enabled: true,
            ttl: ttl.into(),
            logging: LoggingConfig::default(),
        }
    }

    /// Sets whether janitor sweeps are reported.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging.enabled = enabled;
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Turn caching on (default: false)
    /// - `CACHE_TTL` - TTL string such as `30s` (default: empty, resolves to the fallback)
    /// - `CACHE_LOGGING_ENABLED` - Report janitor sweeps (default: false)
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
            ttl: env::var("CACHE_TTL").unwrap_or_default(),
            logging: LoggingConfig {
                enabled: env::var("CACHE_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| parse_bool(&v))
                    .unwrap_or(false),
            },
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
