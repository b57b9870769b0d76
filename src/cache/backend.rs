//! Cache client abstraction.
//!
//! The engine talks to whichever key-value backend the deployment provides
//! through [`CacheBackend`]: Redis in production (`infra::redis`), an
//! in-process map for tests and single-node installs. All values are strings;
//! TTL writes are atomic (value and expiry land together).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {message}")]
    Unavailable { message: String },
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Key-value cache operations the engine relies on.
///
/// `multi_get` must preserve ordering: result index `i` corresponds to
/// `keys[i]`. Backend failures surface as [`CacheError`]; they are never
/// folded into "key absent".
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Store `value` under `key` with the expiry applied in the same
    /// operation, so a crash can never leave the value without its TTL.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;
}

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-process [`CacheBackend`] with deadline-based lazy expiry.
///
/// Suitable for tests and single-node deployments; entries are dropped the
/// first time they are read past their deadline.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_one(
        entries: &mut HashMap<String, MemoryEntry>,
        key: &str,
        now: Instant,
    ) -> Option<String> {
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut guard = self.entries.write().await;
        Ok(Self::read_one(&mut guard, key, Instant::now()))
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        let mut guard = self.entries.write().await;
        let now = Instant::now();
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(Self::read_one(&mut guard, key, now));
        }
        Ok(out)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut guard = self.entries.write().await;
        guard.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut guard = self.entries.write().await;
        guard.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut guard = self.entries.write().await;
        if let Some(entry) = guard.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let mut guard = self.entries.write().await;
        let now = Instant::now();
        let mut deleted = 0;
        for key in keys {
            if let Some(entry) = guard.remove(key) {
                if !entry.is_expired(now) {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }
}
