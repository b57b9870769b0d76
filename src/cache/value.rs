//! Cached-value decoding and the negative-cache sentinel.
//!
//! The cache stores strings. Three outcomes matter at every call site: the
//! cache held a value, the cache held the reserved "store has no row"
//! sentinel, or the cache held nothing at all. [`Resolution`] carries that
//! distinction so callers never re-derive it from raw strings.

use tracing::warn;

/// Reserved value meaning "the authoritative store was asked and returned no
/// row". All encode/decode logic routes through this module; no call site
/// compares against the literal.
pub const NOT_FOUND_SENTINEL: &str = "__not_found__";

/// Token a cached `true` is stored as.
pub const BOOL_TRUE: &str = "true";
/// Token a cached `false` is stored as.
pub const BOOL_FALSE: &str = "false";

/// Outcome of a single cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The cache held a decodable value.
    Found(T),
    /// The cache held nothing; the store must be consulted.
    NotCached,
    /// The cache held the sentinel: the store was already consulted and had
    /// no row. Terminal, no store round trip.
    NotFound,
}

impl<T> Resolution<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn is_not_cached(&self) -> bool {
        matches!(self, Resolution::NotCached)
    }
}

/// Decode a raw cache read as a string value.
pub fn resolve_str(raw: Option<String>) -> Resolution<String> {
    match raw {
        None => Resolution::NotCached,
        Some(v) if v == NOT_FOUND_SENTINEL => Resolution::NotFound,
        Some(v) => Resolution::Found(v),
    }
}

/// Decode a raw cache read as a boolean.
///
/// Booleans decode only through their two fixed tokens; the sentinel is
/// checked separately and a boolean `false` can never be mistaken for it.
pub fn resolve_bool(raw: Option<String>) -> Resolution<bool> {
    match raw.as_deref() {
        None => Resolution::NotCached,
        Some(NOT_FOUND_SENTINEL) => Resolution::NotFound,
        Some(BOOL_TRUE) => Resolution::Found(true),
        Some(BOOL_FALSE) => Resolution::Found(false),
        Some(other) => {
            warn!(value = other, "undecodable cached boolean, treating as miss");
            Resolution::NotCached
        }
    }
}

/// Decode a raw cache read as an integer.
///
/// A present value that does not parse is treated as a miss: the cache is
/// allowed to be wrong and self-heals through the fallback path.
pub fn resolve_i64(raw: Option<String>) -> Resolution<i64> {
    match raw.as_deref() {
        None => Resolution::NotCached,
        Some(NOT_FOUND_SENTINEL) => Resolution::NotFound,
        Some(v) => match v.parse::<i64>() {
            Ok(n) => Resolution::Found(n),
            Err(_) => {
                warn!(value = v, "undecodable cached integer, treating as miss");
                Resolution::NotCached
            }
        },
    }
}

pub fn encode_str(value: &String) -> String {
    value.clone()
}

pub fn encode_bool(value: &bool) -> String {
    if *value { BOOL_TRUE } else { BOOL_FALSE }.to_string()
}

pub fn encode_i64(value: &i64) -> String {
    value.to_string()
}
