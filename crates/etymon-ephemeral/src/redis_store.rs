// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis-backed implementation of the ephemeral store.
//!
//! Uses a multiplexed [`ConnectionManager`], which reconnects on its own
//! after a dropped connection; each operation clones the handle. No
//! operation is retried here.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};
use tracing::{debug, info};

use etymon_core::{EphemeralStore, EtymonError};

/// Increments KEYS[1] and applies ARGV[1] milliseconds of expiry only when
/// the key has none, all in one server-side step.
const INCR_EXPIRE_LUA: &str = r#"
local count = redis.call('INCR', KEYS[1])
if redis.call('PTTL', KEYS[1]) < 0 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

fn store_err(op: &'static str) -> impl Fn(RedisError) -> EtymonError {
    move |e| EtymonError::Store {
        message: format!("redis {op} failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// [`EphemeralStore`] over a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    incr_expire: Script,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to `url` and prove the server answers.
    ///
    /// A malformed address or a server that cannot be reached within
    /// `connect_timeout` is a configuration error: the caller is expected
    /// to refuse to start.
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, EtymonError> {
        let client = redis::Client::open(url)
            .map_err(|e| EtymonError::Config(format!("invalid store url: {e}")))?;

        let conn = tokio::time::timeout(connect_timeout, client.get_connection_manager())
            .await
            .map_err(|_| {
                EtymonError::Config(format!(
                    "store unreachable: no connection within {connect_timeout:?}"
                ))
            })?
            .map_err(|e| EtymonError::Config(format!("store unreachable: {e}")))?;

        let store = Self {
            conn,
            incr_expire: Script::new(INCR_EXPIRE_LUA),
        };

        tokio::time::timeout(connect_timeout, store.ping())
            .await
            .map_err(|_| EtymonError::Config("store did not answer PING".to_string()))?
            .map_err(|e| EtymonError::Config(format!("store unreachable: {e}")))?;

        info!(backend = "redis", "ephemeral store connected");
        Ok(store)
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

/// Exclusive upper bound for a prefix scan: `(` + prefix + 0xFF.
fn prefix_upper_bound(prefix: &str) -> Vec<u8> {
    let mut max = Vec::with_capacity(prefix.len() + 2);
    max.push(b'(');
    max.extend_from_slice(prefix.as_bytes());
    max.push(0xFF);
    max
}

#[async_trait]
impl EphemeralStore for RedisStore {
    fn backend(&self) -> &str {
        "redis"
    }

    async fn ping(&self) -> Result<(), EtymonError> {
        let mut conn = self.conn();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(store_err("PING"))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EtymonError> {
        let mut conn = self.conn();
        conn.get(key).await.map_err(store_err("GET"))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), EtymonError> {
        let mut conn = self.conn();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(store_err("SET"))
    }

    async fn delete(&self, key: &str) -> Result<(), EtymonError> {
        let mut conn = self.conn();
        conn.del::<_, ()>(key).await.map_err(store_err("DEL"))
    }

    async fn increment(&self, key: &str) -> Result<i64, EtymonError> {
        let mut conn = self.conn();
        conn.incr(key, 1i64).await.map_err(store_err("INCR"))
    }

    async fn increment_and_expire(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, EtymonError> {
        let mut conn = self.conn();
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut invocation = self.incr_expire.key(key);
        invocation.arg(window_ms);
        invocation
            .invoke_async(&mut conn)
            .await
            .map_err(store_err("INCR+PEXPIRE"))
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, EtymonError> {
        let mut conn = self.conn();
        let ms: i64 = redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(store_err("PTTL"))?;
        // -2: no such key, -1: no expiry.
        Ok(u64::try_from(ms).ok().map(Duration::from_millis))
    }

    async fn sorted_set_add(&self, set_key: &str, members: &[String]) -> Result<(), EtymonError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(set_key);
        for member in members {
            cmd.arg(0).arg(member);
        }
        let added: u64 = cmd
            .query_async(&mut conn)
            .await
            .map_err(store_err("ZADD"))?;
        debug!(set_key, batch = members.len(), added, "sorted set batch written");
        Ok(())
    }

    async fn sorted_set_range_by_prefix(
        &self,
        set_key: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, EtymonError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn();
        let min = format!("[{prefix}");
        redis::cmd("ZRANGEBYLEX")
            .arg(set_key)
            .arg(min)
            .arg(prefix_upper_bound(prefix))
            .arg("LIMIT")
            .arg(0)
            .arg(limit)
            .query_async(&mut conn)
            .await
            .map_err(store_err("ZRANGEBYLEX"))
    }

    async fn sorted_set_card(&self, set_key: &str) -> Result<u64, EtymonError> {
        let mut conn = self.conn();
        conn.zcard(set_key).await.map_err(store_err("ZCARD"))
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        let mut conn = self.conn();
        conn.sadd::<_, _, ()>(set_key, member)
            .await
            .map_err(store_err("SADD"))
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), EtymonError> {
        let mut conn = self.conn();
        conn.srem::<_, _, ()>(set_key, member)
            .await
            .map_err(store_err("SREM"))
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, EtymonError> {
        let mut conn = self.conn();
        conn.smembers(set_key).await.map_err(store_err("SMEMBERS"))
    }

    async fn list_push(&self, key: &str, value: &[u8]) -> Result<u64, EtymonError> {
        let mut conn = self.conn();
        conn.rpush(key, value).await.map_err(store_err("RPUSH"))
    }

    async fn list_all(&self, key: &str) -> Result<Vec<Vec<u8>>, EtymonError> {
        let mut conn = self.conn();
        conn.lrange(key, 0, -1).await.map_err(store_err("LRANGE"))
    }

    async fn list_len(&self, key: &str) -> Result<u64, EtymonError> {
        let mut conn = self.conn();
        conn.llen(key).await.map_err(store_err("LLEN"))
    }

    async fn list_trim_front(&self, key: &str, count: u64) -> Result<(), EtymonError> {
        if count == 0 {
            return Ok(());
        }
        let mut conn = self.conn();
        let start = isize::try_from(count).unwrap_or(isize::MAX);
        conn.ltrim::<_, ()>(key, start, -1)
            .await
            .map_err(store_err("LTRIM"))
    }

    async fn list_delete(&self, key: &str) -> Result<(), EtymonError> {
        let mut conn = self.conn();
        conn.del::<_, ()>(key).await.map_err(store_err("DEL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_is_exclusive_and_byte_terminated() {
        assert_eq!(prefix_upper_bound("ca"), b"(ca\xff".to_vec());
        assert_eq!(prefix_upper_bound(""), b"(\xff".to_vec());
    }

    #[test]
    fn lua_script_only_expires_fresh_keys() {
        assert!(INCR_EXPIRE_LUA.contains("PTTL"));
        assert!(INCR_EXPIRE_LUA.contains("< 0"));
    }

    #[tokio::test]
    async fn malformed_url_is_config_error() {
        let err = RedisStore::connect("not a url", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, EtymonError::Config(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_config_error() {
        // Port 1 on loopback refuses connections.
        let err = RedisStore::connect("redis://127.0.0.1:1", Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, EtymonError::Config(_)));
    }
}
