use super::KvStore;
use crate::Result;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use ohno::bail;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// An in-process [`KvStore`].
///
/// Clones share the same map. Expired entries are dropped lazily on access.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail until switched back, to simulate an unreachable store.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    /// Time left before `key` expires, if it exists.
    #[must_use]
    pub fn expires_in(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.expires_at - now)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().expect("lock not poisoned")
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::Acquire) {
            bail!("memory store is offline");
        }
        Ok(())
    }

    fn live_value(entries: &HashMap<String, Entry>, key: &str, now: Instant) -> Option<String> {
        entries.get(key).filter(|e| e.expires_at > now).map(|e| e.value.clone())
    }
}

impl KvStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.check_online()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_online()?;
        Ok(Self::live_value(&self.lock(), key, Instant::now()))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        self.check_online()?;
        let now = Instant::now();
        let entries = self.lock();
        Ok(keys.iter().map(|key| Self::live_value(&entries, key, now)).collect())
    }

    async fn set_all_ex(&self, entries: &[(String, String)], ttl: Duration) -> Result<()> {
        self.check_online()?;
        let expires_at = Instant::now() + ttl;
        let mut map = self.lock();
        for (key, value) in entries {
            let _ = map.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    expires_at,
                },
            );
        }
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.check_online()?;
        let now = Instant::now();
        let mut map = self.lock();
        if Self::live_value(&map, key, now).is_some() {
            return Ok(false);
        }

        let _ = map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        self.check_online()?;
        let now = Instant::now();
        let mut map = self.lock();
        let removed = keys
            .iter()
            .filter_map(|key| map.remove(key))
            .filter(|e| e.expires_at > now)
            .count();
        Ok(removed as u64)
    }
}
