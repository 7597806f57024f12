//! Cache Lifecycle and Read-Through Module
//!
//! [`FetchCache`] ties the store, the TTL resolver and the janitor together
//! behind an init/shutdown lifecycle, and implements the read-through lookup.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore, Loader, SweepReport, TtlResolver};
use crate::config::CacheConfig;
use crate::tasks::{spawn_janitor_task, JanitorHandle};

// == Lifecycle State ==
#[derive(Debug, Default)]
struct LifecycleState {
    config: CacheConfig,
    initialized: bool,
    store: Arc<CacheStore>,
    janitor: Option<JanitorHandle>,
}

#[derive(Debug, Default)]
struct Inner {
    state: RwLock<LifecycleState>,
    ttl: TtlResolver,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(janitor) = self.state.get_mut().janitor.take() {
            janitor.abort();
        }
    }
}

// == Fetch Cache ==
/// A read-through cache in front of an expensive fetch.
///
/// The handle is cheap to clone; clones share the same store and lifecycle.
/// Independent caches are simply independent `FetchCache::new()` values.
///
/// A new cache is uninitialized and behaves as disabled: every lookup goes
/// straight to the loader. [`init`](FetchCache::init) switches it on,
/// [`shutdown`](FetchCache::shutdown) resets it.
///
/// Concurrent misses on the same key each run their loader and the last write
/// wins; there is no per-key deduplication.
#[derive(Debug, Clone, Default)]
pub struct FetchCache {
    inner: Arc<Inner>,
}

impl FetchCache {
    // == Constructor ==
    /// Creates an uninitialized, disabled cache.
    pub fn new() -> Self {
        Self::default()
    }

    // == Init ==
    /// Applies `config` and, if caching is enabled, starts the janitor.
    ///
    /// Only the first call after construction or [`shutdown`](FetchCache::shutdown)
    /// takes effect. Later calls log a warning and leave the current
    /// configuration in place.
    ///
    /// The janitor runs on the current Tokio runtime. An enabled `config`
    /// applied outside a runtime is refused with a warning and the cache stays
    /// uninitialized, so a later `init` from within a runtime is accepted.
    pub fn init(&self, config: CacheConfig) {
        let mut state = self.inner.state.write();
        if state.initialized {
            warn!("Caution: the caching mechanism was already initialized, ignoring new config");
            return;
        }
        if config.enabled && Handle::try_current().is_err() {
            warn!("No Tokio runtime available for the cache janitor, ignoring init");
            return;
        }

        state.initialized = true;
        state.config = config;
        // Whatever was memoized before this init belongs to an older configuration
        self.inner.ttl.reset();

        if state.config.enabled {
            let ttl = self.inner.ttl.resolve(&state.config.ttl);
            let janitor =
                spawn_janitor_task(state.store.clone(), ttl, state.config.logging.enabled);
            state.janitor = Some(janitor);
            info!(ttl = ?ttl, "Caching is enabled");
        } else {
            info!("Caching is disabled");
        }
    }

    // == Shut Down ==
    /// Stops the janitor, drops every entry and returns to the disabled state.
    ///
    /// A later [`init`](FetchCache::init) is accepted again and resolves its TTL
    /// from scratch. Fills still in flight finish against the discarded store.
    pub fn shutdown(&self) {
        let janitor = {
            let mut state = self.inner.state.write();
            state.initialized = false;
            state.config = CacheConfig::default();
            state.store = Arc::new(CacheStore::new());
            self.inner.ttl.reset();
            state.janitor.take()
        };

        if let Some(janitor) = janitor {
            janitor.abort();
            debug!("Cache janitor stopped");
        }
        info!("Cache shut down");
    }

    // == Get From Cache ==
    /// Returns the payload for `key`, calling `loader` only on a miss.
    ///
    /// - Disabled: returns `loader`'s result directly and stores nothing.
    /// - Hit: returns the stored payload, even if it has expired but not yet
    ///   been swept.
    /// - Miss: runs `loader`. Success is stored for one TTL and returned;
    ///   failure is logged, not stored, and returned unchanged.
    ///
    /// Keys are used verbatim; callers namespace them as needed
    /// (e.g. `"{id}_{locale}"`).
    pub async fn get_from_cache<L: Loader>(
        &self,
        key: &str,
        loader: L,
    ) -> Result<Bytes, L::Error> {
        let (enabled, store) = {
            let state = self.inner.state.read();
            (state.config.enabled, state.store.clone())
        };

        if !enabled {
            return loader.load().await;
        }

        match store.get(key) {
            Some(data) => Ok(data),
            None => self.fill(&store, key, &loader).await,
        }
    }

    async fn fill<L: Loader>(
        &self,
        store: &CacheStore,
        key: &str,
        loader: &L,
    ) -> Result<Bytes, L::Error> {
        match loader.load().await {
            Ok(data) => {
                store.insert(key, data.clone(), self.ttl());
                Ok(data)
            }
            Err(e) => {
                store.record_fetch_failure();
                warn!(key, error = %e, "Error filling cache");
                Err(e)
            }
        }
    }

    // == TTL ==
    /// Returns the resolved TTL, resolving the configured TTL string on first use.
    pub fn ttl(&self) -> Duration {
        let state = self.inner.state.read();
        self.inner.ttl.resolve(&state.config.ttl)
    }

    // == Purge Expired ==
    /// Runs one sweep over the current store right away.
    pub fn purge_expired(&self) -> SweepReport {
        self.store().purge_expired()
    }

    // == Inspection ==
    /// Returns a copy of the entry under `key` without counting a hit or miss.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.inner.state.read().store.peek(key)
    }

    /// Returns true between `init` and `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.inner.state.read().initialized
    }

    /// Returns true if lookups currently go through the cache.
    pub fn is_enabled(&self) -> bool {
        self.inner.state.read().config.enabled
    }

    /// Returns the configuration in effect.
    pub fn config(&self) -> CacheConfig {
        self.inner.state.read().config.clone()
    }

    /// Returns statistics for the current store.
    pub fn stats(&self) -> CacheStats {
        self.store().stats()
    }

    /// Returns the number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.store().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    fn store(&self) -> Arc<CacheStore> {
        self.inner.state.read().store.clone()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::Instant;

    fn ok_loader(
        value: &'static str,
    ) -> impl Fn() -> std::future::Ready<anyhow::Result<Bytes>> + Send + Sync {
        move || std::future::ready(Ok(Bytes::from_static(value.as_bytes())))
    }

    fn enabled_cache(ttl: &str) -> FetchCache {
        let cache = FetchCache::new();
        cache.init(CacheConfig::enabled(ttl).with_logging(true));
        cache
    }

    #[tokio::test]
    async fn test_new_cache_is_uninitialized_and_bypasses() {
        let cache = FetchCache::new();
        assert!(!cache.is_initialized());
        assert!(!cache.is_enabled());

        let data = cache.get_from_cache("k", ok_loader("v")).await.unwrap();
        assert_eq!(data, "v");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = enabled_cache("2s");

        let first = cache.get_from_cache("k", ok_loader("V")).await.unwrap();
        assert_eq!(first, "V");

        // A failing loader is never consulted once the key is stored
        let second = cache
            .get_from_cache("k", || async { Err::<Bytes, _>(anyhow::anyhow!("unused")) })
            .await
            .unwrap();
        assert_eq!(second, "V");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.fills, 1);
    }

    #[tokio::test]
    async fn test_disabled_bypass_always_calls_loader() {
        let cache = FetchCache::new();
        cache.init(CacheConfig::default());
        assert!(cache.is_initialized());

        let counter = AtomicUsize::new(0);
        let calls = &counter;
        for _ in 0..3 {
            let data = cache
                .get_from_cache("k", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(Bytes::from_static(b"fresh"))
                })
                .await
                .unwrap();
            assert_eq!(data, "fresh");
        }

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(cache.entry("k").is_none());
        assert_eq!(cache.stats().misses, 0);
    }

    #[tokio::test]
    async fn test_error_is_returned_and_not_cached() {
        let cache = enabled_cache("2s");

        let err = cache
            .get_from_cache("testId2", || async {
                Err::<Bytes, _>(anyhow::anyhow!("dam an error"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "dam an error");
        assert!(cache.entry("testId2").is_none());
        assert_eq!(cache.stats().fetch_failures, 1);

        // No negative caching: the next lookup retries the loader
        let data = cache.get_from_cache("testId2", ok_loader("recovered")).await.unwrap();
        assert_eq!(data, "recovered");
    }

    #[tokio::test]
    async fn test_prefilled_entry_is_served() {
        let cache = enabled_cache("2s");
        cache.store().insert_entry(
            "existingId_testingLocale",
            CacheEntry::new(
                Bytes::from_static(b"existing content"),
                Duration::from_secs(5 * 3600),
            ),
        );

        let data = cache
            .get_from_cache("existingId_testingLocale", ok_loader("other"))
            .await
            .unwrap();
        assert_eq!(data, "existing content");
    }

    #[tokio::test]
    async fn test_second_init_is_ignored() {
        let cache = enabled_cache("2s");
        cache.init(CacheConfig {
            enabled: false,
            ttl: "10m".to_string(),
            ..CacheConfig::default()
        });

        assert!(cache.is_enabled());
        assert_eq!(cache.config().ttl, "2s");
        assert_eq!(cache.ttl(), Duration::from_secs(2));
    }

    #[test]
    fn test_enabled_init_outside_runtime_is_refused() {
        let cache = FetchCache::new();
        cache.init(CacheConfig::enabled("2s"));

        assert!(!cache.is_initialized());
        assert!(!cache.is_enabled());
        assert_eq!(cache.config(), CacheConfig::default());

        // The refused init leaves room for one made from within a runtime
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async { cache.init(CacheConfig::enabled("2s")) });

        assert!(cache.is_initialized());
        assert!(cache.is_enabled());
        assert_eq!(cache.ttl(), Duration::from_secs(2));
    }

    #[test]
    fn test_disabled_init_needs_no_runtime() {
        let cache = FetchCache::new();
        cache.init(CacheConfig::default());

        assert!(cache.is_initialized());
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn test_ttl_fallback_is_stable() {
        let cache = enabled_cache("15 kps");

        assert_eq!(cache.ttl(), Duration::from_secs(300));
        assert_eq!(cache.ttl(), Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_sweeps_expired_entry() {
        let cache = enabled_cache("1s");
        cache.store().insert_entry(
            "test",
            CacheEntry {
                data: Bytes::new(),
                expires_at: Instant::now(),
            },
        );

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(cache.entry("test").is_none());
        assert_eq!(cache.stats().expired_removed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_uses_resolved_ttl() {
        let cache = enabled_cache("2s");
        let before = Instant::now();

        cache.get_from_cache("k", ok_loader("v")).await.unwrap();

        let entry = cache.entry("k").unwrap();
        assert_eq!(entry.expires_at, before + Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_resets_and_allows_reinit() {
        let cache = enabled_cache("2s");
        cache.get_from_cache("k", ok_loader("v")).await.unwrap();
        let old_store = cache.store();

        cache.shutdown();

        assert!(!cache.is_initialized());
        assert!(!cache.is_enabled());
        assert_eq!(cache.config(), CacheConfig::default());
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());

        // The old janitor no longer sweeps the discarded store
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(old_store.stats().sweeps, 0);

        cache.init(CacheConfig::enabled("10m"));
        assert!(cache.is_enabled());
        assert_eq!(cache.ttl(), Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_janitor() {
        let cache = enabled_cache("1s");
        let store = cache.store();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(store.stats().sweeps, 1);

        drop(cache);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.stats().sweeps, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_each_fill() {
        let cache = enabled_cache("1m");
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let slow_loader = || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, anyhow::Error>(Bytes::from(format!("fill {n}")))
        };

        let (a, b, c) = tokio::join!(
            cache.get_from_cache("herd", slow_loader),
            cache.get_from_cache("herd", slow_loader),
            cache.get_from_cache("herd", slow_loader),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().fills, 3);
    }
}
