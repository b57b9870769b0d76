//! Hostname-to-domain resolution.
//!
//! A request's hostname can be served by one of three stored forms: a
//! wildcard of itself, the plain hostname, or a wildcard of its parent. The
//! triple is derived syntactically, probed in one batched cache read, and
//! settled against the store only when the cache has no opinion.

use tracing::warn;

use super::error::StorageError;
use super::keys;
use super::storage::Storage;
use super::value::{self, Resolution};

/// Marker prefix of wildcard domain rows (`*.example.com`).
pub const WILDCARD_PREFIX: &str = "*.";

/// A resolved hostname: the serving domain's id and the effective subdomain.
/// Non-wildcard domains never carry a subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDomain {
    pub domain_id: i64,
    pub subdomain: String,
}

/// The three stored forms that could serve `hostname`, in precedence order:
/// wildcard-of-self, self, wildcard-of-parent.
///
/// A hostname with no separator (or of length two or less) has no distinct
/// parent; its parent-wildcard candidate degrades to a wildcard of the whole
/// string, keeping the triple total for any input.
pub fn candidates(hostname: &str) -> [String; 3] {
    let parent = if hostname.len() <= 2 {
        hostname
    } else {
        hostname
            .split_once('.')
            .map(|(_, rest)| rest)
            .unwrap_or(hostname)
    };

    [
        format!("{WILDCARD_PREFIX}{hostname}"),
        hostname.to_string(),
        format!("{WILDCARD_PREFIX}{parent}"),
    ]
}

/// The naive subdomain label: everything before the first `.`.
pub fn subdomain_label(hostname: &str) -> &str {
    hostname
        .split_once('.')
        .map(|(label, _)| label)
        .unwrap_or(hostname)
}

/// Only a wildcard row gives the subdomain label meaning; a plain domain
/// serves the root.
fn effective_subdomain(matched_domain: &str, hostname: &str) -> String {
    if matched_domain.starts_with(WILDCARD_PREFIX) {
        subdomain_label(hostname).to_string()
    } else {
        String::new()
    }
}

impl Storage {
    /// Resolve a request hostname to `(domain_id, effective_subdomain)`.
    ///
    /// `None` means no stored form serves this hostname; whether that is
    /// fatal is the caller's policy.
    pub async fn resolve_domain(
        &self,
        hostname: &str,
    ) -> Result<Option<ResolvedDomain>, StorageError> {
        let candidates = candidates(hostname);
        let candidate_keys: Vec<String> =
            candidates.iter().map(|c| keys::domain_id(c)).collect();
        let resolutions = self.multi_resolve(&candidate_keys).await?;

        let mut any_uncached = false;
        for (candidate, resolution) in candidates.iter().zip(resolutions) {
            match resolution {
                Resolution::Found(raw) => match raw.parse::<i64>() {
                    Ok(domain_id) => {
                        return Ok(Some(ResolvedDomain {
                            domain_id,
                            subdomain: effective_subdomain(candidate, hostname),
                        }));
                    }
                    Err(_) => {
                        warn!(%candidate, "undecodable cached domain id, treating as miss");
                        any_uncached = true;
                    }
                },
                Resolution::NotFound => {}
                Resolution::NotCached => any_uncached = true,
            }
        }

        // Every candidate is negative-cached: the hostname is known absent.
        if !any_uncached {
            return Ok(None);
        }

        let rows = self
            .domains
            .matching(&candidates)
            .await
            .map_err(StorageError::Store)?;

        // A hostname can match several stored forms at once; candidate order
        // decides the winner.
        let winner = candidates
            .iter()
            .find_map(|candidate| rows.iter().find(|row| &row.domain == candidate));

        match winner {
            Some(row) => {
                // Cache only the confirmed mapping. The losing candidates are
                // not known to be absent, so no sentinel is written for them.
                let confirmed_key = keys::domain_id(&row.domain);
                self.cache
                    .set_with_ttl(
                        &confirmed_key,
                        &row.domain_id.to_string(),
                        self.ttl.domains,
                    )
                    .await?;

                Ok(Some(ResolvedDomain {
                    domain_id: row.domain_id,
                    subdomain: effective_subdomain(&row.domain, hostname),
                }))
            }
            None => {
                // All three forms are genuinely absent; negative-cache each.
                for key in &candidate_keys {
                    self.cache
                        .set_with_ttl(key, value::NOT_FOUND_SENTINEL, self.ttl.domains)
                        .await?;
                }
                Ok(None)
            }
        }
    }
}
