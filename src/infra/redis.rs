//! Redis cache backend.
//!
//! One logical client per process: a multiplexed connection manager that is
//! cheap to clone, safe for concurrent use and reconnects on failure. Every
//! operation failure maps to [`CacheError::Unavailable`]; absence of a key
//! is a value, not an error.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};

use crate::cache::backend::{CacheBackend, CacheError};

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)
            .map_err(|err| CacheError::unavailable(format!("invalid redis url: {err}")))?;

        let manager = client
            .get_connection_manager()
            .await
            .map_err(|err| CacheError::unavailable(format!("redis connection failed: {err}")))?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|err| CacheError::unavailable(format!("redis GET failed: {err}")))
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.manager.clone();
        conn.mget::<_, Vec<Option<String>>>(keys)
            .await
            .map_err(|err| CacheError::unavailable(format!("redis MGET failed: {err}")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|err| CacheError::unavailable(format!("redis SET failed: {err}")))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|err| CacheError::unavailable(format!("redis SETEX failed: {err}")))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.expire::<_, ()>(key, ttl.as_secs() as i64)
            .await
            .map_err(|err| CacheError::unavailable(format!("redis EXPIRE failed: {err}")))
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.manager.clone();
        conn.del::<_, u64>(keys)
            .await
            .map_err(|err| CacheError::unavailable(format!("redis DEL failed: {err}")))
    }
}
