/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */
use std::net::{IpAddr, Ipv4Addr};

use ipnetwork::IpNetwork;
use model::network::Network;
use sqlx::PgConnection;

use super::DatabaseError;

/// Lowest free address in the usable range of a block.
///
/// Walks the hosts of the block lazily, clamped to `[ip_start, ip_end]`,
/// merging against `employed`, which must yield unique addresses in
/// ascending order (the order [`crate::lease::employed_ips`] returns).
/// Nothing outside the usable range is ever proposed, and host addresses
/// a family does not lease (the v4 network and broadcast addresses) are
/// skipped by the walk itself.
///
/// Returns `None` when every usable address is employed.
pub fn first_free_ip<I>(network: &Network, employed: I) -> Option<IpAddr>
where
    I: IntoIterator<Item = IpAddr>,
{
    let mut employed = employed.into_iter().peekable();

    for host in ippool_net::hosts(&network.network) {
        if host < network.ip_start {
            continue;
        }
        if host > network.ip_end {
            break;
        }
        // Catch the cursor up first: employed addresses below the
        // candidate can never match a later host.
        while employed.next_if(|used| *used < host).is_some() {}
        if employed.next_if_eq(&host).is_some() {
            continue;
        }
        return Some(host);
    }
    None
}

/// [`first_free_ip`] against the stored employed set of the block.
///
/// The result is only a proposal: nothing is reserved until the caller
/// registers a lease on it, and a concurrent registration of the same
/// address loses with [`DatabaseError::DuplicateAddress`] and retries.
pub async fn next_free_ip(
    txn: &mut PgConnection,
    network: &Network,
) -> Result<Option<IpAddr>, DatabaseError> {
    let employed = crate::lease::employed_ips(txn, network.id).await?;
    let free = first_free_ip(network, employed);
    if free.is_none() {
        tracing::warn!(%network, "no free address left in the usable range");
    }
    Ok(free)
}

/// IPv4-only variant of [`next_free_ip`] that pushes the merge into the
/// database instead of streaming the employed set out. Yields the same
/// address as the host walk for any v4 block; returns `None` for v6
/// blocks and exhausted ranges.
pub async fn next_free_ip_v4(
    txn: &mut PgConnection,
    network: &Network,
) -> Result<Option<IpAddr>, DatabaseError> {
    let (base, span) = match v4_usable_span(network) {
        Some(run) => run,
        None => return Ok(None),
    };

    let query = r#"
SELECT ($1::inet + ip_series.n)::inet AS ip
FROM generate_series(0, $2::bigint) AS ip_series(n)
LEFT JOIN leases AS l
  ON l.ip = ($1::inet + ip_series.n)::inet
  AND l.network_id = $3::uuid
  AND NOT l.is_dynamic
WHERE l.ip IS NULL
ORDER BY ip
LIMIT 1;
    "#;
    let free: Option<IpAddr> = sqlx::query_scalar(query)
        .bind(IpAddr::V4(base))
        .bind(i64::from(span))
        .bind(network.id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;

    if free.is_none() {
        tracing::warn!(%network, "no free address left in the usable range");
    }
    Ok(free)
}

/* The usable v4 addresses of a block form one contiguous run: the host
 * span of the prefix intersected with [ip_start, ip_end]. Computing the
 * run here keeps the SQL to a single generate_series over offsets. */
fn v4_usable_span(network: &Network) -> Option<(Ipv4Addr, u32)> {
    let (net, start, end) = match (network.network, network.ip_start, network.ip_end) {
        (IpNetwork::V4(net), IpAddr::V4(start), IpAddr::V4(end)) => (net, start, end),
        _ => return None,
    };

    let mut first = u32::from(net.network());
    let mut last = u32::from(net.broadcast());
    if net.prefix() < 31 {
        first += 1;
        last -= 1;
    }
    let lo = first.max(u32::from(start));
    let hi = last.min(u32::from(end));
    if lo > hi {
        return None;
    }
    Some((Ipv4Addr::from(lo), hi - lo))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use model::NetworkId;
    use model::network::NetworkKind;

    use super::*;

    fn network(cidr: &str, start: &str, end: &str) -> Network {
        Network {
            id: NetworkId::from(uuid::Uuid::new_v4()),
            network: cidr.parse().unwrap(),
            kind: NetworkKind::Guest,
            description: "unit".to_string(),
            ip_start: start.parse().unwrap(),
            ip_end: end.parse().unwrap(),
            created: Utc::now(),
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn empty_block_yields_range_start() {
        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.20");
        assert_eq!(first_free_ip(&net, []), Some(ip("192.168.1.10")));
    }

    #[test]
    fn skips_employed_addresses() {
        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.20");
        let employed = vec![ip("192.168.1.10"), ip("192.168.1.11"), ip("192.168.1.13")];
        assert_eq!(first_free_ip(&net, employed), Some(ip("192.168.1.12")));
    }

    #[test]
    fn exhausted_range_yields_none() {
        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.11");
        let employed = vec![ip("192.168.1.10"), ip("192.168.1.11")];
        assert_eq!(first_free_ip(&net, employed), None);
    }

    #[test]
    fn range_start_below_first_host_lands_on_first_host() {
        let net = network("192.168.1.0/24", "192.168.1.0", "192.168.1.20");
        assert_eq!(first_free_ip(&net, []), Some(ip("192.168.1.1")));
    }

    #[test]
    fn employed_outside_range_does_not_hide_free_addresses() {
        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.20");
        let employed = vec![ip("192.168.1.1"), ip("192.168.1.2"), ip("192.168.1.25")];
        assert_eq!(first_free_ip(&net, employed), Some(ip("192.168.1.10")));
    }

    #[test]
    fn repeated_queries_agree_until_something_is_registered() {
        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.20");
        let employed = vec![ip("192.168.1.10")];
        assert_eq!(
            first_free_ip(&net, employed.iter().copied()),
            first_free_ip(&net, employed.iter().copied()),
        );
    }

    #[test]
    fn single_address_range() {
        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.10");
        assert_eq!(first_free_ip(&net, []), Some(ip("192.168.1.10")));
        assert_eq!(first_free_ip(&net, [ip("192.168.1.10")]), None);
    }

    #[test]
    fn broadcast_is_never_proposed() {
        let net = network("192.168.1.0/24", "192.168.1.250", "192.168.1.255");
        let employed: Vec<IpAddr> = (250..=254)
            .map(|h| IpAddr::V4(Ipv4Addr::new(192, 168, 1, h)))
            .collect();
        assert_eq!(first_free_ip(&net, employed), None);
    }

    #[test]
    fn point_to_point_block_uses_all_addresses() {
        let net = network("10.0.0.0/31", "10.0.0.0", "10.0.0.1");
        assert_eq!(first_free_ip(&net, []), Some(ip("10.0.0.0")));
        assert_eq!(first_free_ip(&net, [ip("10.0.0.0")]), Some(ip("10.0.0.1")));
    }

    #[test]
    fn v6_block_allocates_within_range() {
        let net = network("2001:db8::/64", "2001:db8::10", "2001:db8::20");
        assert_eq!(first_free_ip(&net, []), Some(ip("2001:db8::10")));
        assert_eq!(
            first_free_ip(&net, [ip("2001:db8::10")]),
            Some(ip("2001:db8::11"))
        );
    }

    /// Feeding every proposal back as employed walks the range in strictly
    /// ascending order until it runs out.
    #[test]
    fn proposals_are_strictly_ascending() {
        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.13");
        let mut employed: Vec<IpAddr> = Vec::new();
        let mut seen: Vec<IpAddr> = Vec::new();
        while let Some(free) = first_free_ip(&net, employed.iter().copied()) {
            if let Some(last) = seen.last() {
                assert!(free > *last);
            }
            seen.push(free);
            employed.push(free);
        }
        assert_eq!(
            seen,
            vec![
                ip("192.168.1.10"),
                ip("192.168.1.11"),
                ip("192.168.1.12"),
                ip("192.168.1.13"),
            ]
        );
    }

    #[test]
    fn usable_span_clamps_to_host_addresses() {
        let net = network("192.168.1.0/24", "192.168.1.0", "192.168.1.255");
        assert_eq!(
            v4_usable_span(&net),
            Some(("192.168.1.1".parse().unwrap(), 253))
        );

        let net = network("192.168.1.0/24", "192.168.1.10", "192.168.1.20");
        assert_eq!(
            v4_usable_span(&net),
            Some(("192.168.1.10".parse().unwrap(), 10))
        );

        let net = network("2001:db8::/64", "2001:db8::10", "2001:db8::20");
        assert_eq!(v4_usable_span(&net), None);
    }
}
