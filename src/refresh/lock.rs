use crate::Result;
use crate::sources::SourceId;
use crate::store::{CacheKeys, KvStore};
use chrono::Utc;
use core::time::Duration;

const LOG_TARGET: &str = "      lock";

/// Mutual exclusion for git syncs across every instance sharing the store.
///
/// The lock is a key written only if absent, with an expiry so a crashed holder cannot block the
/// source forever. Release deletes the key unconditionally.
#[derive(Debug, Clone)]
pub struct DistributedLock<S> {
    store: S,
    ttl: Duration,
}

impl<S: KvStore> DistributedLock<S> {
    #[must_use]
    pub const fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Tries once to take the lock for `source`.
    ///
    /// Returns `false` if another holder has it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be reached.
    pub async fn try_acquire(&self, source: SourceId) -> Result<bool> {
        let key = CacheKeys::lock(source);
        let holder = format!("{}:{}", std::process::id(), Utc::now().timestamp_millis());

        let acquired = self.store.set_nx_ex(&key, &holder, self.ttl).await?;
        log::debug!(target: LOG_TARGET, "Lock for {source} {}", if acquired { "acquired" } else { "busy" });
        Ok(acquired)
    }

    pub async fn release(&self, source: SourceId) {
        if let Err(e) = self.store.delete(&[CacheKeys::lock(source)]).await {
            log::error!(target: LOG_TARGET, "Could not release lock for {source}: {e:#}");
        }
    }
}
