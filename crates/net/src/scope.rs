/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt::Display;
use std::net::{Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;

/// Where in the address space a block lives. Administrative listings show
/// this next to the CIDR so operators can spot a public block handed to a
/// guest pool (or the reverse) at a glance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressScope {
    Unspecified,
    Loopback,
    LinkLocal,
    Multicast,
    Reserved,
    Private,
    /// Carrier-grade NAT space, 100.64.0.0/10.
    Shared,
    Documentation,
    /// fc00::/7.
    UniqueLocal,
    /// Deprecated fec0::/10, still seen on old gear.
    SiteLocal,
    Global,
}

impl Display for AddressScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AddressScope::Unspecified => "unspecified",
            AddressScope::Loopback => "loopback",
            AddressScope::LinkLocal => "link-local",
            AddressScope::Multicast => "multicast",
            AddressScope::Reserved => "reserved",
            AddressScope::Private => "private",
            AddressScope::Shared => "shared",
            AddressScope::Documentation => "documentation",
            AddressScope::UniqueLocal => "unique-local",
            AddressScope::SiteLocal => "site-local",
            AddressScope::Global => "global",
        };
        f.write_str(name)
    }
}

/// Classify a block by its network address. Special-purpose ranges win over
/// the `Global` fallback; among themselves they are disjoint, so the check
/// order only groups the cheap bit tests first.
pub fn scope(network: &IpNetwork) -> AddressScope {
    match network {
        IpNetwork::V4(net) => v4_scope(net.network()),
        IpNetwork::V6(net) => v6_scope(net.network()),
    }
}

fn v4_scope(addr: Ipv4Addr) -> AddressScope {
    let octets = addr.octets();
    if addr.is_unspecified() {
        AddressScope::Unspecified
    } else if addr.is_loopback() {
        AddressScope::Loopback
    } else if addr.is_link_local() {
        AddressScope::LinkLocal
    } else if addr.is_multicast() {
        AddressScope::Multicast
    } else if octets[0] >= 240 {
        // 240.0.0.0/4, including the limited broadcast address.
        AddressScope::Reserved
    } else if addr.is_private() {
        AddressScope::Private
    } else if octets[0] == 100 && (octets[1] & 0xc0) == 0x40 {
        AddressScope::Shared
    } else if addr.is_documentation() {
        AddressScope::Documentation
    } else {
        AddressScope::Global
    }
}

fn v6_scope(addr: Ipv6Addr) -> AddressScope {
    let segments = addr.segments();
    if addr.is_unspecified() {
        AddressScope::Unspecified
    } else if addr.is_loopback() {
        AddressScope::Loopback
    } else if addr.is_multicast() {
        AddressScope::Multicast
    } else if (segments[0] & 0xffc0) == 0xfe80 {
        AddressScope::LinkLocal
    } else if (segments[0] & 0xfe00) == 0xfc00 {
        AddressScope::UniqueLocal
    } else if (segments[0] & 0xffc0) == 0xfec0 {
        AddressScope::SiteLocal
    } else if segments[0] == 0x2001 && segments[1] == 0xdb8 {
        AddressScope::Documentation
    } else {
        AddressScope::Global
    }
}
