//! Ban resolution.
//!
//! User bans are a single keyed fact. IP bans are stored at network-prefix
//! granularity, so one address is checked against every aggregation level in
//! a fixed narrow-to-wide order; the common no-ban case is answered with a
//! single batched cache read.

use std::net::IpAddr;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::debug;

use crate::domain::net;

use super::error::StorageError;
use super::keys;
use super::storage::Storage;
use super::value::{self, Resolution};

/// What a ban check is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanTarget {
    User(i64),
    Ip(IpAddr),
}

/// Seconds until a ban row expires, clamped at zero. Cache entries for bans
/// must never outlive the ban itself.
pub(crate) fn remaining_ttl(end_timestamp: OffsetDateTime, now: OffsetDateTime) -> Duration {
    let secs = (end_timestamp - now).whole_seconds();
    Duration::from_secs(secs.max(0) as u64)
}

impl Storage {
    /// Resolve the ban reason for a target, `None` when unbanned.
    pub async fn resolve_ban(&self, target: BanTarget) -> Result<Option<String>, StorageError> {
        match target {
            BanTarget::User(user_id) => self.resolve_user_ban(user_id).await,
            BanTarget::Ip(addr) => self.resolve_ip_ban(addr).await,
        }
    }

    async fn resolve_user_ban(&self, user_id: i64) -> Result<Option<String>, StorageError> {
        let key = keys::user_ban(user_id);

        match value::resolve_str(self.cache.get(&key).await?) {
            Resolution::Found(reason) => Ok(Some(reason)),
            Resolution::NotFound => Ok(None),
            Resolution::NotCached => {
                let row = self
                    .bans
                    .active_user_ban(user_id)
                    .await
                    .map_err(StorageError::Store)?;

                match row {
                    Some(row) => {
                        let ttl = remaining_ttl(row.end_timestamp, OffsetDateTime::now_utc());
                        self.cache.set_with_ttl(&key, &row.reason, ttl).await?;
                        debug!(user_id, "user ban cached from store");
                        Ok(Some(row.reason))
                    }
                    None => {
                        self.cache
                            .set_with_ttl(&key, value::NOT_FOUND_SENTINEL, self.ttl.ban_negative)
                            .await?;
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Check the aggregation candidates with one batched cache read.
    ///
    /// Precedence is "first candidate order that has a cached answer":
    /// cached answers are honored before any uncached candidate is settled
    /// against the store, so an address covered by an already-cached wider
    /// ban costs zero store queries. Only when no level has an opinion are
    /// the uncached candidates settled, in order. A store hit is cached at
    /// the *matched* network's key (possibly wider than the probed
    /// candidate) for the ban's remaining lifetime; a store miss
    /// negative-caches only the probed candidate, briefly — caching the
    /// absence any wider would suppress bans inserted at other levels.
    async fn resolve_ip_ban(&self, addr: IpAddr) -> Result<Option<String>, StorageError> {
        let candidates = net::ban_candidates(addr);
        let candidate_keys: Vec<String> = candidates.iter().map(keys::ip_ban).collect();
        let resolutions = self.multi_resolve(&candidate_keys).await?;

        for resolution in &resolutions {
            if let Resolution::Found(reason) = resolution {
                return Ok(Some(reason.clone()));
            }
        }

        for ((candidate, key), resolution) in candidates
            .iter()
            .zip(candidate_keys.iter())
            .zip(resolutions)
        {
            if !resolution.is_not_cached() {
                continue;
            }

            let row = self
                .bans
                .narrowest_ip_ban(*candidate)
                .await
                .map_err(StorageError::Store)?;

            match row {
                Some(row) => {
                    let matched_key = keys::ip_ban(&row.network);
                    let ttl = remaining_ttl(row.end_timestamp, OffsetDateTime::now_utc());
                    self.cache.set_with_ttl(&matched_key, &row.reason, ttl).await?;
                    debug!(
                        candidate = %candidate,
                        matched = %row.network,
                        "ip ban cached from store"
                    );
                    return Ok(Some(row.reason));
                }
                None => {
                    self.cache
                        .set_with_ttl(key, value::NOT_FOUND_SENTINEL, self.ttl.ban_negative)
                        .await?;
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use time::Duration as TimeDuration;

    use super::*;

    #[test]
    fn remaining_ttl_matches_ban_lifetime() {
        let now = OffsetDateTime::now_utc();
        let ttl = remaining_ttl(now + TimeDuration::seconds(120), now);
        assert_eq!(ttl, Duration::from_secs(120));
    }

    #[test]
    fn remaining_ttl_truncates_partial_seconds() {
        let now = OffsetDateTime::now_utc();
        let ttl = remaining_ttl(now + TimeDuration::milliseconds(10_700), now);
        assert_eq!(ttl, Duration::from_secs(10));
    }

    #[test]
    fn remaining_ttl_never_negative() {
        let now = OffsetDateTime::now_utc();
        let ttl = remaining_ttl(now - TimeDuration::seconds(5), now);
        assert_eq!(ttl, Duration::ZERO);
    }
}
