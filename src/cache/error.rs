//! Engine error taxonomy.
//!
//! Only infrastructure failures are errors. "The store has no such row" is a
//! normal `Ok(None)` everywhere in this crate; callers decide whether absence
//! is fatal for them.

use thiserror::Error;

use crate::application::repos::RepoError;

use super::backend::CacheError;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The cache backend could not be reached. Not silently downgraded to a
    /// store query: under a sustained cache outage that would redirect the
    /// full read load at the database. Callers own the degradation decision.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// The authoritative store failed on a fallback query. Never converted
    /// to "not found".
    #[error(transparent)]
    Store(#[from] RepoError),
}
