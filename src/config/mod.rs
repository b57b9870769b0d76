//! Configuration layer: typed settings with layered precedence (file → env).
//!
//! Settings load from `argent.toml` in the working directory (optional) and
//! `ARGENT_*` environment variables, e.g. `ARGENT_DATABASE__URL` or
//! `ARGENT_CACHE__USER_FACTS_TTL_SECS`.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::TtlPolicy;

const LOCAL_CONFIG_BASENAME: &str = "argent";
const ENV_PREFIX: &str = "ARGENT";

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_USER_FACTS_TTL_SECS: u64 = 600;
const DEFAULT_OBJECT_TTL_SECS: u64 = 600;
const DEFAULT_DOMAIN_TTL_SECS: u64 = 600;
const DEFAULT_BAN_NEGATIVE_TTL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
        }
    }
}

/// TTLs in whole seconds for the cached fact classes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub user_facts_ttl_secs: u64,
    pub object_ttl_secs: u64,
    pub domain_ttl_secs: u64,
    pub ban_negative_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            user_facts_ttl_secs: DEFAULT_USER_FACTS_TTL_SECS,
            object_ttl_secs: DEFAULT_OBJECT_TTL_SECS,
            domain_ttl_secs: DEFAULT_DOMAIN_TTL_SECS,
            ban_negative_ttl_secs: DEFAULT_BAN_NEGATIVE_TTL_SECS,
        }
    }
}

impl From<&CacheSettings> for TtlPolicy {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            user_facts: Duration::from_secs(settings.user_facts_ttl_secs),
            objects: Duration::from_secs(settings.object_ttl_secs),
            domains: Duration::from_secs(settings.domain_ttl_secs),
            ban_negative: Duration::from_secs(settings.ban_negative_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

fn default_db_max_connections() -> u32 {
    DEFAULT_DB_MAX_CONNECTIONS
}

/// Load settings from the local config file (if present) layered under
/// `ARGENT_*` environment variables.
pub fn load() -> Result<Settings, SettingsError> {
    Config::builder()
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()
        .map_err(Into::into)
}
