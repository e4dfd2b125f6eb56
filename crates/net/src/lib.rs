/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

//! Address-space arithmetic shared by the pool allocator and the network
//! registry: lazy host enumeration over a CIDR block, prefix overlap
//! testing, and scope classification. Everything here is pure; persistence
//! lives elsewhere.

use ipnetwork::IpNetwork;

mod hosts;
mod scope;

pub use hosts::{HostIter, hosts};
pub use scope::{AddressScope, scope};

/// Standard CIDR overlap test: two prefixes overlap iff one of them
/// contains the other's network address. Prefixes of different address
/// families never overlap.
pub fn overlaps(a: &IpNetwork, b: &IpNetwork) -> bool {
    a.contains(b.network()) || b.contains(a.network())
}
