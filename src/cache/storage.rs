//! The cache-aside engine.
//!
//! One `Storage` instance serves the whole process: check the cache, fall
//! back to the store on a miss, write the answer (or the negative-cache
//! sentinel) back with a TTL, return the store's answer. At most one cache
//! read per call; on the miss path exactly one store query and one cache
//! write. No retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ipnetwork::IpNetwork;
use metrics::counter;
use tracing::debug;

use crate::application::repos::{BansRepo, DomainsRepo, ObjectsRepo, RepoError, UsersRepo};

use super::backend::CacheBackend;
use super::error::StorageError;
use super::keys::{self, ObjectKind, UserField};
use super::value::{self, Resolution};

const DEFAULT_USER_FACTS_TTL: Duration = Duration::from_secs(600);
const DEFAULT_OBJECT_TTL: Duration = Duration::from_secs(600);
const DEFAULT_DOMAIN_TTL: Duration = Duration::from_secs(600);
const DEFAULT_BAN_NEGATIVE_TTL: Duration = Duration::from_secs(300);

/// TTLs for the fact classes the engine caches.
///
/// Ban hits do not appear here: a positive ban is cached for its remaining
/// lifetime, derived from the row's own end timestamp.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    pub user_facts: Duration,
    pub objects: Duration,
    pub domains: Duration,
    /// TTL for "no ban at this aggregation level" sentinels. Kept short:
    /// the absence is cheap to re-derive and a ban may land at any moment.
    pub ban_negative: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            user_facts: DEFAULT_USER_FACTS_TTL,
            objects: DEFAULT_OBJECT_TTL,
            domains: DEFAULT_DOMAIN_TTL,
            ban_negative: DEFAULT_BAN_NEGATIVE_TTL,
        }
    }
}

/// Authentication facts for one user, aggregated from individually cached
/// fields. `None` unless every component resolved.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub password_hash: String,
    pub active: bool,
}

/// The read-through cache over users, bans, domains and stored objects.
///
/// Holds no locks and no mutable state; safe to share behind an `Arc` across
/// request tasks. Ban and domain resolution live in sibling modules but hang
/// off this type.
pub struct Storage {
    pub(crate) cache: Arc<dyn CacheBackend>,
    pub(crate) users: Arc<dyn UsersRepo>,
    pub(crate) bans: Arc<dyn BansRepo>,
    pub(crate) domains: Arc<dyn DomainsRepo>,
    pub(crate) objects: Arc<dyn ObjectsRepo>,
    pub(crate) ttl: TtlPolicy,
}

impl Storage {
    pub fn new(
        cache: Arc<dyn CacheBackend>,
        users: Arc<dyn UsersRepo>,
        bans: Arc<dyn BansRepo>,
        domains: Arc<dyn DomainsRepo>,
        objects: Arc<dyn ObjectsRepo>,
        ttl: TtlPolicy,
    ) -> Self {
        Self {
            cache,
            users,
            bans,
            domains,
            objects,
            ttl,
        }
    }

    // ========================================================================
    // Core cache-aside primitives
    // ========================================================================

    /// Generic read-through lookup. `decode`/`encode` fix the value type;
    /// `fallback` runs at most once, only on the not-cached path, and its
    /// answer (not a cache re-read) is what the caller gets.
    async fn fetch_with<T, F>(
        &self,
        key: &str,
        ttl: Duration,
        decode: fn(Option<String>) -> Resolution<T>,
        encode: fn(&T) -> String,
        fallback: F,
    ) -> Result<Option<T>, StorageError>
    where
        F: Future<Output = Result<Option<T>, RepoError>>,
    {
        match decode(self.cache.get(key).await?) {
            Resolution::Found(found) => {
                counter!("argent_cache_hit_total").increment(1);
                Ok(Some(found))
            }
            Resolution::NotFound => {
                counter!("argent_cache_negative_hit_total").increment(1);
                Ok(None)
            }
            Resolution::NotCached => {
                counter!("argent_cache_miss_total").increment(1);
                let fetched = fallback.await.map_err(StorageError::Store)?;
                counter!("argent_store_fallback_total").increment(1);

                let encoded = match &fetched {
                    Some(found) => encode(found),
                    None => value::NOT_FOUND_SENTINEL.to_string(),
                };
                self.cache.set_with_ttl(key, &encoded, ttl).await?;
                debug!(key, cached_value = fetched.is_some(), "populated from store");
                Ok(fetched)
            }
        }
    }

    pub(crate) async fn fetch_str_with<F>(
        &self,
        key: &str,
        ttl: Duration,
        fallback: F,
    ) -> Result<Option<String>, StorageError>
    where
        F: Future<Output = Result<Option<String>, RepoError>>,
    {
        self.fetch_with(key, ttl, value::resolve_str, value::encode_str, fallback)
            .await
    }

    pub(crate) async fn fetch_bool_with<F>(
        &self,
        key: &str,
        ttl: Duration,
        fallback: F,
    ) -> Result<Option<bool>, StorageError>
    where
        F: Future<Output = Result<Option<bool>, RepoError>>,
    {
        self.fetch_with(key, ttl, value::resolve_bool, value::encode_bool, fallback)
            .await
    }

    pub(crate) async fn fetch_i64_with<F>(
        &self,
        key: &str,
        ttl: Duration,
        fallback: F,
    ) -> Result<Option<i64>, StorageError>
    where
        F: Future<Output = Result<Option<i64>, RepoError>>,
    {
        self.fetch_with(key, ttl, value::resolve_i64, value::encode_i64, fallback)
            .await
    }

    /// Resolve many keys in one backend round trip. Result index `i`
    /// corresponds to `keys[i]`.
    pub async fn multi_resolve(
        &self,
        keys: &[String],
    ) -> Result<Vec<Resolution<String>>, StorageError> {
        let raw = self.cache.multi_get(keys).await?;
        Ok(raw.into_iter().map(value::resolve_str).collect())
    }

    // ========================================================================
    // User identity facts
    // ========================================================================

    pub async fn user_active(&self, user_id: i64) -> Result<Option<bool>, StorageError> {
        let key = keys::user_field(user_id, UserField::Active);
        self.fetch_bool_with(&key, self.ttl.user_facts, self.users.active(user_id))
            .await
    }

    pub async fn user_password_hash(
        &self,
        user_id: i64,
    ) -> Result<Option<String>, StorageError> {
        let key = keys::user_field(user_id, UserField::PasswordHash);
        self.fetch_str_with(&key, self.ttl.user_facts, self.users.password_hash(user_id))
            .await
    }

    pub async fn username(&self, user_id: i64) -> Result<Option<String>, StorageError> {
        let key = keys::user_field(user_id, UserField::Username);
        self.fetch_str_with(&key, self.ttl.user_facts, self.users.username(user_id))
            .await
    }

    pub async fn user_id_by_name(&self, username: &str) -> Result<Option<i64>, StorageError> {
        let key = keys::user_id_by_name(username);
        self.fetch_i64_with(&key, self.ttl.user_facts, self.users.id_by_username(username))
            .await
    }

    /// Aggregate the facts authentication needs. Each field resolves through
    /// its own key; the context exists only when all of them do.
    pub async fn auth_context(
        &self,
        user_id: i64,
    ) -> Result<Option<AuthContext>, StorageError> {
        let password_hash = self.user_password_hash(user_id).await?;
        let active = self.user_active(user_id).await?;

        Ok(match (password_hash, active) {
            (Some(password_hash), Some(active)) => Some(AuthContext {
                password_hash,
                active,
            }),
            _ => None,
        })
    }

    pub async fn auth_context_by_name(
        &self,
        username: &str,
    ) -> Result<Option<(i64, AuthContext)>, StorageError> {
        let Some(user_id) = self.user_id_by_name(username).await? else {
            return Ok(None);
        };

        Ok(self
            .auth_context(user_id)
            .await?
            .map(|context| (user_id, context)))
    }

    // ========================================================================
    // Stored objects
    // ========================================================================

    pub async fn file_path(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let key = keys::object(ObjectKind::File, domain_id, subdomain, shortname);
        self.fetch_str_with(
            &key,
            self.ttl.objects,
            self.objects.file_path(shortname, domain_id, subdomain),
        )
        .await
    }

    pub async fn redirect_target(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let key = keys::object(ObjectKind::Shorten, domain_id, subdomain, shortname);
        self.fetch_str_with(
            &key,
            self.ttl.objects,
            self.objects.redirect_target(shortname, domain_id, subdomain),
        )
        .await
    }

    pub async fn file_mime(&self, shortname: &str) -> Result<Option<String>, StorageError> {
        let key = keys::file_mime(shortname);
        self.fetch_str_with(&key, self.ttl.objects, self.objects.file_mime(shortname))
            .await
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Delete keys outright. Invalidation is always deletion, never an
    /// in-place update; the next reader repopulates from the store.
    pub async fn invalidate_keys(&self, cache_keys: &[String]) -> Result<u64, StorageError> {
        if cache_keys.is_empty() {
            return Ok(0);
        }
        let deleted = self.cache.delete(cache_keys).await?;
        counter!("argent_cache_invalidation_total").increment(deleted);
        debug!(requested = cache_keys.len(), deleted, "invalidated cache keys");
        Ok(deleted)
    }

    pub async fn invalidate_user(
        &self,
        user_id: i64,
        fields: &[UserField],
    ) -> Result<u64, StorageError> {
        let cache_keys: Vec<String> = fields
            .iter()
            .map(|&field| keys::user_field(user_id, field))
            .collect();
        self.invalidate_keys(&cache_keys).await
    }

    /// Writers inserting a user ban call this so the next check sees it
    /// immediately instead of waiting out a negative-cache TTL.
    pub async fn invalidate_user_ban(&self, user_id: i64) -> Result<u64, StorageError> {
        self.invalidate_keys(&[keys::user_ban(user_id)]).await
    }

    /// Same as [`Self::invalidate_user_ban`], for a network-level ban.
    pub async fn invalidate_ip_ban(&self, network: &IpNetwork) -> Result<u64, StorageError> {
        self.invalidate_keys(&[keys::ip_ban(network)]).await
    }

    pub async fn invalidate_object(
        &self,
        kind: ObjectKind,
        domain_id: i64,
        subdomain: Option<&str>,
        shortname: &str,
    ) -> Result<u64, StorageError> {
        self.invalidate_keys(&[keys::object(kind, domain_id, subdomain, shortname)])
            .await
    }
}
