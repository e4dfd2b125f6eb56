/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::ids::{LeaseId, NetworkId};

/// One handed-out address. The address is unique across every lease of
/// every network; that single database constraint is what arbitrates two
/// concurrent allocations of the same address (see `db::lease`).
///
/// Leases are never deleted when an address comes back: they are freed
/// (`is_active` = false) and either reactivated on reuse or eventually
/// collected by the expiry job once older than the configured lifetime.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Lease {
    pub id: LeaseId,
    pub ip: IpAddr,
    pub network_id: NetworkId,
    /// When the lease began; reset by the database on insert only.
    pub lease_time: DateTime<Utc>,
    /// Dynamically acquired (handed out by the NAS) as opposed to
    /// statically employed by an administrator. Only static leases count
    /// as employed for the allocator walk.
    pub is_dynamic: bool,
    pub is_active: bool,
}

impl fmt::Display for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ip.fmt(f)
    }
}
