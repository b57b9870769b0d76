//! Application-level contracts between the cache engine and persistence.

pub mod repos;
