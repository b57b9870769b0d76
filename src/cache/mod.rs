//! Argent cache layer.
//!
//! Read-through caching with negative caching for the hot request path:
//! identity facts, ban checks, domain resolution and object lookups. The
//! engine answers from the cache when it can, consults Postgres exactly once
//! per cold key, and remembers confirmed absence so nonexistent entities
//! stop costing store round trips.
//!
//! ## Resolution protocol
//!
//! Every cache read lands in one of three states: `Found` (a decodable
//! value), `NotFound` (the reserved sentinel: the store was already asked
//! and had no row), or `NotCached` (no opinion; ask the store). See
//! [`value::Resolution`].

pub mod backend;
pub mod bans;
pub mod domains;
pub mod error;
pub mod keys;
pub mod storage;
pub mod value;

pub use backend::{CacheBackend, CacheError, MemoryCache};
pub use bans::BanTarget;
pub use domains::{ResolvedDomain, WILDCARD_PREFIX};
pub use error::StorageError;
pub use keys::{NO_SUBDOMAIN, ObjectKind, UserField};
pub use storage::{AuthContext, Storage, TtlPolicy};
pub use value::{NOT_FOUND_SENTINEL, Resolution};
