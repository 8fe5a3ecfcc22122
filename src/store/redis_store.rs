use super::KvStore;
use crate::Result;
use core::fmt;
use core::time::Duration;
use ohno::IntoAppError;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

const LOG_TARGET: &str = "     redis";

/// [`KvStore`] backed by Redis.
///
/// Holds a [`ConnectionManager`], which multiplexes requests over one connection and reconnects
/// on its own after failures.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to the server at `url`, giving up after `timeout`.
    ///
    /// The URL is never logged since it may carry a password.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).into_app_err("invalid Redis URL")?;

        log::debug!(target: LOG_TARGET, "Connecting to Redis");
        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .into_app_err_with(|| format!("Redis connection timeout after {}ms", timeout.as_millis()))?
            .into_app_err("could not connect to Redis")?;

        Ok(Self { conn })
    }
}

/// Redis rejects `EX 0`.
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl KvStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await.into_app_err("Redis PING failed")?;
        log::trace!(target: LOG_TARGET, "PING replied {reply}");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.into_app_err_with(|| format!("Redis GET '{key}' failed"))?;
        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        // an explicit MGET so a single key still replies with an array
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await.into_app_err("Redis MGET failed")?;
        Ok(values)
    }

    async fn set_all_ex(&self, entries: &[(String, String)], ttl: Duration) -> Result<()> {
        let mut pipe = redis::pipe();
        let _ = pipe.atomic();
        for (key, value) in entries {
            let _ = pipe.cmd("SET").arg(key).arg(value).arg("EX").arg(expiry_secs(ttl)).ignore();
        }

        let mut conn = self.conn.clone();
        let () = pipe.query_async(&mut conn).await.into_app_err("Redis MULTI/SET failed")?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(expiry_secs(ttl))
            .query_async(&mut conn)
            .await
            .into_app_err_with(|| format!("Redis SET NX '{key}' failed"))?;
        Ok(reply.is_some())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(keys).await.into_app_err("Redis DEL failed")?;
        Ok(removed)
    }
}
