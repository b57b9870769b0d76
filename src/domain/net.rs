//! IP network normalization and ban aggregation candidates.
//!
//! Bans are stored at network-prefix granularity, not per address. A single
//! address must therefore be checked against every aggregation level the
//! service recognizes, from the address's own point network outward.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};

/// Supernet prefixes probed for IPv4 addresses, narrowest first.
pub const V4_AGGREGATIONS: [u8; 1] = [24];

/// Supernet prefixes probed for IPv6 addresses, narrowest first.
pub const V6_AGGREGATIONS: [u8; 3] = [64, 48, 32];

/// The `/32` or `/128` network holding exactly this address.
pub fn point_network(addr: IpAddr) -> IpNetwork {
    IpNetwork::from(addr)
}

/// The containing network of `addr` at `prefix`, with host bits masked off.
///
/// Returns `None` only for a prefix longer than the address family allows.
pub fn supernet(addr: IpAddr, prefix: u8) -> Option<IpNetwork> {
    match addr {
        IpAddr::V4(v4) => {
            let mask = if prefix == 0 {
                0
            } else {
                u32::MAX << (32u8.checked_sub(prefix)?)
            };
            let base = Ipv4Addr::from(u32::from(v4) & mask);
            Ipv4Network::new(base, prefix).ok().map(IpNetwork::V4)
        }
        IpAddr::V6(v6) => {
            let mask = if prefix == 0 {
                0
            } else {
                u128::MAX << (128u8.checked_sub(prefix)?)
            };
            let base = Ipv6Addr::from(u128::from(v6) & mask);
            Ipv6Network::new(base, prefix).ok().map(IpNetwork::V6)
        }
    }
}

/// Ordered candidate networks for ban resolution: the point network first,
/// then each wider aggregation. The order is a correctness property — the
/// resolver returns the first candidate with a cached answer, so narrower
/// scopes win purely by position.
pub fn ban_candidates(addr: IpAddr) -> Vec<IpNetwork> {
    let prefixes: &[u8] = match addr {
        IpAddr::V4(_) => &V4_AGGREGATIONS,
        IpAddr::V6(_) => &V6_AGGREGATIONS,
    };

    let mut candidates = Vec::with_capacity(1 + prefixes.len());
    candidates.push(point_network(addr));
    candidates.extend(
        prefixes
            .iter()
            .filter_map(|&prefix| supernet(addr, prefix)),
    );
    candidates
}
