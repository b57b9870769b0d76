//! Cache key construction.
//!
//! Every cached fact lives under a stable, namespaced key. The shapes here are
//! a wire contract: writers outside this crate (ban insertion, file deletion,
//! admin tooling) delete the same keys to invalidate, so they must not drift
//! within a deployment.

use std::fmt;

use ipnetwork::IpNetwork;

/// Placeholder for an absent subdomain in object keys.
///
/// `@` is not a legal hostname label, so it can never collide with a stored
/// subdomain. The empty string is a legal subdomain (it means "root") and
/// therefore cannot double as the absence marker.
pub const NO_SUBDOMAIN: &str = "@";

/// Per-user facts the cache layer knows how to fetch and invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Active,
    PasswordHash,
    Username,
}

impl UserField {
    pub fn as_str(self) -> &'static str {
        match self {
            UserField::Active => "active",
            UserField::PasswordHash => "password_hash",
            UserField::Username => "username",
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object categories with distinct key namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Uploaded file, resolved to its filesystem path.
    File,
    /// Shortened link, resolved to its redirect target.
    Shorten,
}

impl ObjectKind {
    fn prefix(self) -> &'static str {
        match self {
            ObjectKind::File => "fspath",
            ObjectKind::Shorten => "redir",
        }
    }
}

/// Key for a per-user cached fact: `uid:{id}:{field}`.
pub fn user_field(user_id: i64, field: UserField) -> String {
    format!("uid:{user_id}:{field}")
}

/// Key for the username -> user id lookup: `uid:{username}`.
///
/// Field keys always carry three segments, so the two `uid:` shapes cannot
/// collide even for fully numeric usernames.
pub fn user_id_by_name(username: &str) -> String {
    format!("uid:{username}")
}

/// Key for an object lookup: `{fspath|redir}:{domain_id}:{subdomain}:{shortname}`.
///
/// `subdomain` distinguishes three states: `Some("sub")` a literal subdomain,
/// `Some("")` the root subdomain, `None` no subdomain recorded at all.
pub fn object(
    kind: ObjectKind,
    domain_id: i64,
    subdomain: Option<&str>,
    shortname: &str,
) -> String {
    let sub = subdomain.unwrap_or(NO_SUBDOMAIN);
    format!("{}:{domain_id}:{sub}:{shortname}", kind.prefix())
}

/// Key for a file's stored mimetype: `mime:{shortname}`.
pub fn file_mime(shortname: &str) -> String {
    format!("mime:{shortname}")
}

/// Key for a user-level ban: `userban:{id}`.
pub fn user_ban(user_id: i64) -> String {
    format!("userban:{user_id}")
}

/// Key for an IP-network ban at one aggregation level: `ipban:{cidr}`.
pub fn ip_ban(network: &IpNetwork) -> String {
    format!("ipban:{network}")
}

/// Key for a hostname candidate's domain id: `domain_id:{candidate}`.
pub fn domain_id(candidate: &str) -> String {
    format!("domain_id:{candidate}")
}
