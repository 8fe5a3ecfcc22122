//! Shared key/value storage for cached badge data and refresh locks.
//!
//! [`KvStore`] is the narrow set of operations the rest of the crate needs. [`RedisStore`] is the
//! production implementation; [`MemoryStore`] keeps everything in-process and is used by tests and
//! single-instance deployments.
//!
//! [`BadgeCache`] layers the cache-key naming scheme and the hit/miss accounting on top of a store.

mod badge_cache;
mod cache_keys;
mod memory;
mod redis_store;

pub use badge_cache::{BadgeCache, Freshness};
pub use cache_keys::CacheKeys;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use crate::Result;
use core::fmt::Debug;
use core::time::Duration;

/// A shared key/value store with per-key expiry.
///
/// Implementations are cheap to clone and every clone talks to the same underlying data.
pub trait KvStore: Debug + Clone + Send + Sync + 'static {
    /// Checks the store is reachable.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Reads several keys in one round trip. The result is positional.
    fn get_many(&self, keys: &[String]) -> impl Future<Output = Result<Vec<Option<String>>>> + Send;

    /// Writes all entries with the same expiry, atomically.
    fn set_all_ex(&self, entries: &[(String, String)], ttl: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Writes the key only if it does not exist. Returns `true` if the write happened.
    fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> impl Future<Output = Result<bool>> + Send;

    /// Removes keys, returning how many existed.
    fn delete(&self, keys: &[String]) -> impl Future<Output = Result<u64>> + Send;
}
