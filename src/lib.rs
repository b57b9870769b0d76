//! Argent hot-path storage layer.
//!
//! The Argent image host answers millions of cheap lookups per hour — is
//! this user banned, which file does this shortname map to, which domain id
//! serves this hostname — and none of them may hammer Postgres. This crate
//! is the read-through cache between request handling and the relational
//! store: key schema, cache-aside engine with negative caching, IP-network
//! ban resolution and wildcard domain resolution.
//!
//! Request-path callers construct a [`cache::Storage`] over a
//! [`cache::CacheBackend`] (Redis in production, [`cache::MemoryCache`] for
//! tests and single-node installs) and the Postgres repositories in
//! [`infra::db`], then call its resolve/fetch/invalidate operations.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
