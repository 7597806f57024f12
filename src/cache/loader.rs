//! Loader Module
//!
//! The fetch capability the cache calls on a miss.

use std::fmt::Display;
use std::future::Future;

use bytes::Bytes;

// == Loader Trait ==
/// Produces the payload for a key that is not cached yet.
///
/// A loader is opaque to the cache: it may block, perform I/O or fail, and the
/// cache holds no locks while it runs. Its error type belongs to the caller and
/// is returned from [`FetchCache::get_from_cache`](crate::FetchCache::get_from_cache)
/// unchanged.
///
/// Implementors can write `async fn load(&self)`. In addition, any
/// `Fn() -> impl Future<Output = Result<Bytes, E>>` closure is a loader:
///
/// ```
/// use bytes::Bytes;
/// use fetch_cache::{CacheConfig, FetchCache};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = FetchCache::new();
/// cache.init(CacheConfig::enabled("30s"));
///
/// let data = cache
///     .get_from_cache("greeting_en", || async { Ok::<_, std::io::Error>(Bytes::from("hello")) })
///     .await
///     .unwrap();
/// assert_eq!(data, "hello");
/// # }
/// ```
pub trait Loader: Send + Sync {
    /// Failure reported by the underlying fetch
    type Error: Display + Send;

    /// Fetches the payload.
    fn load(&self) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}

impl<F, Fut, E> Loader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, E>> + Send,
    E: Display + Send,
{
    type Error = E;

    fn load(&self) -> impl Future<Output = Result<Bytes, E>> + Send {
        (self)()
    }
}
