//! Infrastructure adapters: Postgres repositories, the Redis cache backend,
//! telemetry bootstrap.

pub mod db;
pub mod error;
pub mod redis;
pub mod telemetry;
