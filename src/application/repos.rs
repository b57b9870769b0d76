//! Repository traits describing the relational queries the cache engine
//! falls back to on a miss.
//!
//! The engine never talks to Postgres directly; it holds trait objects so
//! tests can substitute counting fakes and deployments can swap storage.

use async_trait::async_trait;
use ipnetwork::IpNetwork;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// An unexpired user-level ban.
#[derive(Debug, Clone)]
pub struct BanRow {
    pub reason: String,
    pub end_timestamp: OffsetDateTime,
}

/// An unexpired IP-network ban. `network` may be wider than the network the
/// lookup asked about; it is the granularity the ban was inserted at.
#[derive(Debug, Clone)]
pub struct IpBanRow {
    pub network: IpNetwork,
    pub reason: String,
    pub end_timestamp: OffsetDateTime,
}

/// A registered domain row: the stored domain string (possibly a `*.`
/// wildcard) and its internal id.
#[derive(Debug, Clone)]
pub struct DomainRow {
    pub domain_id: i64,
    pub domain: String,
}

/// Identity facts about users.
#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn id_by_username(&self, username: &str) -> Result<Option<i64>, RepoError>;

    async fn username(&self, user_id: i64) -> Result<Option<String>, RepoError>;

    async fn active(&self, user_id: i64) -> Result<Option<bool>, RepoError>;

    async fn password_hash(&self, user_id: i64) -> Result<Option<String>, RepoError>;
}

/// Ban rows at user and network granularity.
#[async_trait]
pub trait BansRepo: Send + Sync {
    /// The latest unexpired ban for a user, if any.
    async fn active_user_ban(&self, user_id: i64) -> Result<Option<BanRow>, RepoError>;

    /// The narrowest unexpired ban whose network contains `network`.
    ///
    /// "Contains" is the CIDR supernet relation; when several rows match,
    /// the one with the longest mask must be returned.
    async fn narrowest_ip_ban(&self, network: IpNetwork) -> Result<Option<IpBanRow>, RepoError>;
}

/// Registered domains.
#[async_trait]
pub trait DomainsRepo: Send + Sync {
    /// Every row whose domain string equals one of `candidates`.
    ///
    /// At most one row per candidate can exist; the caller picks the winner
    /// by candidate order.
    async fn matching(&self, candidates: &[String]) -> Result<Vec<DomainRow>, RepoError>;
}

/// Stored objects: uploaded files and shortened links.
#[async_trait]
pub trait ObjectsRepo: Send + Sync {
    /// Filesystem path of an uploaded file, scoped to a domain and
    /// optionally a subdomain.
    async fn file_path(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, RepoError>;

    /// Redirect target of a shortened link.
    async fn redirect_target(
        &self,
        shortname: &str,
        domain_id: i64,
        subdomain: Option<&str>,
    ) -> Result<Option<String>, RepoError>;

    /// Stored mimetype of an uploaded file.
    async fn file_mime(&self, shortname: &str) -> Result<Option<String>, RepoError>;
}
