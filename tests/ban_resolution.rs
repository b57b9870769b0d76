//! Ban resolution: user bans, CIDR aggregation fallback, negative caching
//! and the invalidation contract writers rely on.

mod common;

use std::net::IpAddr;
use std::sync::Arc;

use ipnetwork::IpNetwork;
use time::{Duration as TimeDuration, OffsetDateTime};

use argent_storage::application::repos::{BanRow, IpBanRow};
use argent_storage::cache::{BanTarget, CacheBackend};

use common::{FakeStore, storage_over};

fn in_one_hour() -> OffsetDateTime {
    OffsetDateTime::now_utc() + TimeDuration::hours(1)
}

fn net(spec: &str) -> IpNetwork {
    spec.parse().unwrap()
}

fn addr(spec: &str) -> IpAddr {
    spec.parse().unwrap()
}

#[tokio::test]
async fn banned_user_resolves_and_caches() {
    let store = Arc::new(FakeStore {
        user_bans: vec![(
            42,
            BanRow {
                reason: "spam".to_string(),
                end_timestamp: in_one_hour(),
            },
        )],
        ..Default::default()
    });
    let (storage, _cache) = storage_over(store.clone());

    assert_eq!(
        storage.resolve_ban(BanTarget::User(42)).await.unwrap(),
        Some("spam".to_string())
    );
    assert_eq!(store.query_count(), 1);

    assert_eq!(
        storage.resolve_ban(BanTarget::User(42)).await.unwrap(),
        Some("spam".to_string())
    );
    assert_eq!(store.query_count(), 1);
}

#[tokio::test]
async fn unbanned_user_is_negative_cached() {
    let store = Arc::new(FakeStore::default());
    let (storage, _cache) = storage_over(store.clone());

    assert_eq!(storage.resolve_ban(BanTarget::User(7)).await.unwrap(), None);
    assert_eq!(storage.resolve_ban(BanTarget::User(7)).await.unwrap(), None);
    assert_eq!(store.query_count(), 1);
}

#[tokio::test]
async fn ip_ban_found_through_wider_aggregation() {
    let store = Arc::new(FakeStore {
        ip_bans: vec![IpBanRow {
            network: net("1.2.3.0/24"),
            reason: "abuse range".to_string(),
            end_timestamp: in_one_hour(),
        }],
        ..Default::default()
    });
    let (storage, cache) = storage_over(store.clone());

    // 1.2.3.4 has no direct entry; the store settles the /32 probe against
    // the /24 ban and caches it at the matched (wider) key.
    assert_eq!(
        storage.resolve_ban(BanTarget::Ip(addr("1.2.3.4"))).await.unwrap(),
        Some("abuse range".to_string())
    );
    assert_eq!(store.query_count(), 1);
    assert_eq!(
        cache.get("ipban:1.2.3.0/24").await.unwrap(),
        Some("abuse range".to_string())
    );

    // A sibling address in the same /24 is served from the cached entry
    // with no new store query.
    assert_eq!(
        storage.resolve_ban(BanTarget::Ip(addr("1.2.3.5"))).await.unwrap(),
        Some("abuse range".to_string())
    );
    assert_eq!(store.query_count(), 1);
}

#[tokio::test]
async fn unbanned_ip_costs_one_query_per_aggregation_then_none() {
    let store = Arc::new(FakeStore::default());
    let (storage, cache) = storage_over(store.clone());

    assert_eq!(
        storage.resolve_ban(BanTarget::Ip(addr("9.9.9.9"))).await.unwrap(),
        None
    );
    // One settlement query per candidate level (/32 and /24).
    assert_eq!(store.query_count(), 2);

    // Every candidate is now negative-cached; a repeat costs nothing.
    assert_eq!(
        storage.resolve_ban(BanTarget::Ip(addr("9.9.9.9"))).await.unwrap(),
        None
    );
    assert_eq!(store.query_count(), 2);

    // The sentinel was written at the candidates' own keys, not wider ones.
    assert!(cache.get("ipban:9.9.9.9/32").await.unwrap().is_some());
    assert!(cache.get("ipban:9.9.9.0/24").await.unwrap().is_some());
}

#[tokio::test]
async fn sibling_address_reuses_only_shared_aggregations() {
    let store = Arc::new(FakeStore::default());
    let (storage, _cache) = storage_over(store.clone());

    storage.resolve_ban(BanTarget::Ip(addr("9.9.9.9"))).await.unwrap();
    assert_eq!(store.query_count(), 2);

    // The sibling's /24 probe is already negative-cached; only its own /32
    // needs settling.
    storage.resolve_ban(BanTarget::Ip(addr("9.9.9.10"))).await.unwrap();
    assert_eq!(store.query_count(), 3);
}

#[tokio::test]
async fn v6_ban_walks_all_aggregation_levels() {
    let store = Arc::new(FakeStore {
        ip_bans: vec![IpBanRow {
            network: net("2001:db8::/32"),
            reason: "bad allocation".to_string(),
            end_timestamp: in_one_hour(),
        }],
        ..Default::default()
    });
    let (storage, cache) = storage_over(store.clone());

    assert_eq!(
        storage
            .resolve_ban(BanTarget::Ip(addr("2001:db8:aaaa:bbbb::1")))
            .await
            .unwrap(),
        Some("bad allocation".to_string())
    );
    // Settled on the first probe: the /128 candidate already matches the
    // /32 row through the containment query.
    assert_eq!(store.query_count(), 1);
    assert_eq!(
        cache.get("ipban:2001:db8::/32").await.unwrap(),
        Some("bad allocation".to_string())
    );
}

#[tokio::test]
async fn ban_insertion_invalidation_beats_negative_ttl() {
    let store = Arc::new(FakeStore::default());
    let (storage, _cache) = storage_over(store.clone());

    assert_eq!(storage.resolve_ban(BanTarget::User(42)).await.unwrap(), None);
    assert_eq!(store.query_count(), 1);

    // A writer inserts a ban and invalidates the key instead of waiting out
    // the negative TTL; recency matters more than hit ratio here.
    let banned = Arc::new(FakeStore {
        user_bans: vec![(
            42,
            BanRow {
                reason: "ban evasion".to_string(),
                end_timestamp: in_one_hour(),
            },
        )],
        ..Default::default()
    });
    let (storage, cache) = storage_over(banned.clone());

    // Simulate the pre-existing negative entry, then the writer's delete.
    cache
        .set("userban:42", argent_storage::cache::NOT_FOUND_SENTINEL)
        .await
        .unwrap();
    assert_eq!(storage.resolve_ban(BanTarget::User(42)).await.unwrap(), None);

    storage.invalidate_user_ban(42).await.unwrap();

    assert_eq!(
        storage.resolve_ban(BanTarget::User(42)).await.unwrap(),
        Some("ban evasion".to_string())
    );
}

#[tokio::test]
async fn ip_ban_invalidation_targets_the_inserted_network() {
    let store = Arc::new(FakeStore {
        ip_bans: vec![IpBanRow {
            network: net("10.0.0.0/24"),
            reason: "scanner".to_string(),
            end_timestamp: in_one_hour(),
        }],
        ..Default::default()
    });
    let (storage, cache) = storage_over(store.clone());

    // Stale negative entries at both levels, as if the checks ran just
    // before the ban was inserted.
    cache
        .set("ipban:10.0.0.8/32", argent_storage::cache::NOT_FOUND_SENTINEL)
        .await
        .unwrap();
    cache
        .set("ipban:10.0.0.0/24", argent_storage::cache::NOT_FOUND_SENTINEL)
        .await
        .unwrap();

    assert_eq!(
        storage.resolve_ban(BanTarget::Ip(addr("10.0.0.8"))).await.unwrap(),
        None
    );

    // The writer invalidates the network it inserted the ban at. The /32
    // sentinel may linger until its short TTL passes; the walk then finds
    // the /24 answer because sentinels are skipped, not returned.
    storage.invalidate_ip_ban(&net("10.0.0.0/24")).await.unwrap();

    assert_eq!(
        storage.resolve_ban(BanTarget::Ip(addr("10.0.0.8"))).await.unwrap(),
        Some("scanner".to_string())
    );
}
