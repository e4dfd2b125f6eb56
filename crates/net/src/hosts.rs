/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;

/// Walk the host addresses of `network` in ascending numeric order.
///
/// The walk is lazy and restartable: nothing is materialized, dropping the
/// iterator terminates it early, and calling `hosts` again starts over from
/// the first host. Which addresses count as hosts follows the usual
/// conventions per family:
///
/// * IPv4 up to /30 excludes the network and broadcast addresses.
/// * IPv4 /31 and /32 yield every address (point-to-point and host routes).
/// * IPv6 up to /126 excludes the network (subnet-router anycast) address.
/// * IPv6 /127 and /128 yield every address.
pub fn hosts(network: &IpNetwork) -> HostIter {
    let cursor = match network {
        IpNetwork::V4(net) => {
            let first = u32::from(net.network());
            let last = u32::from(net.broadcast());
            if net.prefix() >= 31 {
                Cursor::V4 { next: first, last }
            } else {
                Cursor::V4 {
                    next: first + 1,
                    last: last - 1,
                }
            }
        }
        IpNetwork::V6(net) => {
            let first = u128::from(net.network());
            let last = u128::from(net.broadcast());
            if net.prefix() >= 127 {
                Cursor::V6 { next: first, last }
            } else {
                Cursor::V6 {
                    next: first + 1,
                    last,
                }
            }
        }
    };
    HostIter { cursor, done: false }
}

/// Iterator returned by [`hosts`].
#[derive(Clone, Debug)]
pub struct HostIter {
    cursor: Cursor,
    done: bool,
}

// Cursors carry plain integers so that stepping cannot wrap inside an
// address type; the `done` flag covers the block that ends at the top of
// the address space.
#[derive(Clone, Debug)]
enum Cursor {
    V4 { next: u32, last: u32 },
    V6 { next: u128, last: u128 },
}

impl Iterator for HostIter {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        if self.done {
            return None;
        }
        match &mut self.cursor {
            Cursor::V4 { next, last } => {
                let addr = IpAddr::V4(Ipv4Addr::from(*next));
                if next == last {
                    self.done = true;
                } else {
                    *next += 1;
                }
                Some(addr)
            }
            Cursor::V6 { next, last } => {
                let addr = IpAddr::V6(Ipv6Addr::from(*next));
                if next == last {
                    self.done = true;
                } else {
                    *next += 1;
                }
                Some(addr)
            }
        }
    }
}

impl std::iter::FusedIterator for HostIter {}
