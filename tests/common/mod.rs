//! Shared test doubles: an in-memory store with a query counter, so tests
//! can assert exactly how many times the engine fell back past the cache.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ipnetwork::IpNetwork;
use time::OffsetDateTime;

use argent_storage::application::repos::{
    BanRow, BansRepo, DomainRow, DomainsRepo, IpBanRow, ObjectsRepo, RepoError, UsersRepo,
};
use argent_storage::cache::{MemoryCache, Storage, TtlPolicy};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub active: bool,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub shortname: String,
    pub domain_id: i64,
    pub subdomain: Option<String>,
    pub fspath: String,
    pub mimetype: String,
}

#[derive(Debug, Clone)]
pub struct ShortenRecord {
    pub shortname: String,
    pub domain_id: i64,
    pub subdomain: Option<String>,
    pub redirto: String,
}

/// In-memory stand-in for Postgres. Every trait method counts as one store
/// query before answering from the fixture data.
#[derive(Default)]
pub struct FakeStore {
    pub users: Vec<UserRecord>,
    pub user_bans: Vec<(i64, BanRow)>,
    pub ip_bans: Vec<IpBanRow>,
    pub domains: Vec<DomainRow>,
    pub files: Vec<FileRecord>,
    pub shortens: Vec<ShortenRecord>,
    pub queries: AtomicUsize,
}

impl FakeStore {
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    fn subdomain_matches(stored: Option<&str>, requested: Option<&str>) -> bool {
        match requested {
            None => true,
            Some(requested) => stored == Some(requested),
        }
    }
}

#[async_trait]
impl UsersRepo for FakeStore {
    async fn id_by_username(&self, username: &str) -> Result<Option<i64>, RepoError> {
        self.count();
        Ok(self
            .users
            .iter()
            .find(|user| user.username == username)
            .map(|user| user.user_id))
    }

    async fn username(&self, user_id: i64) -> Result<Option<String>, RepoError> {
        self.count();
        Ok(self
            .users
            .iter()
            .find(|user| user.user_id == user_id)
            .map(|user| user.username.clone()))
    }

    async fn active(&self, user_id: i64) -> Result<Option<bool>, RepoError> {
        self.count();
        Ok(self
            .users
            .iter()
            .find(|user| user.user_id == user_id)
            .map(|user| user.active))
    }

    async fn password_hash(&self, user_id: i64) -> Result<Option<String>, RepoError> {
        self.count();
        Ok(self
            .users
            .iter()
            .find(|user| user.user_id == user_id)
            .map(|user| user.password_hash.clone()))
    }
}

#[async_trait]
impl BansRepo for FakeStore {
    async fn active_user_ban(&self, user_id: i64) -> Result<Option<BanRow>, RepoError> {
        self.count();
        let now = OffsetDateTime::now_utc();
        Ok(self
            .user_bans
            .iter()
            .filter(|(id, ban)| *id == user_id && ban.end_timestamp > now)
            .max_by_key(|(_, ban)| ban.end_timestamp)
            .map(|(_, ban)| ban.clone()))
    }

    async fn narrowest_ip_ban(
        &self,
        network: IpNetwork,
    ) -> Result<Option<IpBanRow>, RepoError> {
        self.count();
        let now = OffsetDateTime::now_utc();
        Ok(self
            .ip_bans
            .iter()
            .filter(|ban| {
                ban.end_timestamp > now
                    && ban.network.prefix() <= network.prefix()
                    && ban.network.contains(network.network())
            })
            .max_by_key(|ban| ban.network.prefix())
            .cloned())
    }
}

#[async_trait]
impl DomainsRepo for FakeStore {
    async fn matching(&self, candidates: &[String]) -> Result<Vec<DomainRow>, RepoError> {
        self.count();
        Ok(self
            .domains
            .iter()
            .filter(|row| candidates.contains(&row.domain))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ObjectsRepo for FakeStore {
    async fn file_path(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, RepoError> {
        self.count();
        Ok(self
            .files
            .iter()
            .find(|file| {
                file.shortname == shortname
                    && file.domain_id == domain_id
                    && Self::subdomain_matches(file.subdomain.as_deref(), subdomain)
            })
            .map(|file| file.fspath.clone()))
    }

    async fn redirect_target(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, RepoError> {
        self.count();
        Ok(self
            .shortens
            .iter()
            .find(|shorten| {
                shorten.shortname == shortname
                    && shorten.domain_id == domain_id
                    && Self::subdomain_matches(shorten.subdomain.as_deref(), subdomain)
            })
            .map(|shorten| shorten.redirto.clone()))
    }

    async fn file_mime(&self, shortname: &str) -> Result<Option<String>, RepoError> {
        self.count();
        Ok(self
            .files
            .iter()
            .find(|file| file.shortname == shortname)
            .map(|file| file.mimetype.clone()))
    }
}

/// A `Storage` over a fresh `MemoryCache` and the given fixture store.
pub fn storage_over(store: Arc<FakeStore>) -> (Storage, MemoryCache) {
    let cache = MemoryCache::new();
    let storage = Storage::new(
        Arc::new(cache.clone()),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        TtlPolicy::default(),
    );
    (storage, cache)
}

pub fn alice() -> UserRecord {
    UserRecord {
        user_id: 42,
        username: "alice".to_string(),
        active: true,
        password_hash: "$argon2id$stub".to_string(),
    }
}
