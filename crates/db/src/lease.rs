/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */
use std::net::IpAddr;

use chrono::Utc;
use model::lease::Lease;
use model::network::Network;
use model::settings::Settings;
use model::{LeaseId, NetworkId};
use sqlx::PgConnection;

use super::DatabaseError;

/// Register an address as leased, statically employed or dynamically
/// acquired, active from the start. `lease_time` is set by the database.
///
/// The global unique index on the address is the only arbiter between two
/// concurrent registrations: the loser gets
/// [`DatabaseError::DuplicateAddress`] and is expected to recompute the
/// first free address and try again.
pub async fn create_from_ip(
    txn: &mut PgConnection,
    ip: IpAddr,
    network: &Network,
    is_dynamic: bool,
) -> Result<Lease, DatabaseError> {
    network.ensure_contains(ip)?;

    let query = "INSERT INTO leases (id, ip, network_id, is_dynamic, is_active)
            VALUES ($1::uuid, $2::inet, $3::uuid, $4, TRUE)
            RETURNING *";
    match sqlx::query_as(query)
        .bind(LeaseId::from(uuid::Uuid::new_v4()))
        .bind(ip)
        .bind(network.id)
        .bind(is_dynamic)
        .fetch_one(txn)
        .await
    {
        Ok(lease) => Ok(lease),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            tracing::debug!(%ip, network = %network.network, "address is already leased");
            Err(DatabaseError::DuplicateAddress(ip))
        }
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}

/// The ascending, duplicate-free employed addresses of a block: what the
/// allocator merges the host walk against. Static leases count whether or
/// not they are active; a freed static address is not offered again until
/// its row is deleted. Dynamic leases never count — their addresses are
/// defended by the unique index alone.
pub async fn employed_ips(
    txn: &mut PgConnection,
    network_id: NetworkId,
) -> Result<Vec<IpAddr>, DatabaseError> {
    let query = "SELECT ip FROM leases WHERE network_id=$1 AND NOT is_dynamic ORDER BY ip";
    sqlx::query_scalar(query)
        .bind(network_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find_by_ip(
    txn: &mut PgConnection,
    ip: IpAddr,
) -> Result<Option<Lease>, DatabaseError> {
    let query = "SELECT * FROM leases WHERE ip=$1::inet";
    sqlx::query_as(query)
        .bind(ip)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Every lease of a block, newest first.
pub async fn find_for_network(
    txn: &mut PgConnection,
    network_id: NetworkId,
) -> Result<Vec<Lease>, DatabaseError> {
    let query = "SELECT * FROM leases WHERE network_id=$1 ORDER BY lease_time DESC, id";
    sqlx::query_as(query)
        .bind(network_id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Deactivate a lease without deleting it, so the address can be
/// reclaimed by expiry or reactivated on reuse. Freeing a freed lease is
/// a no-op.
pub async fn free(txn: &mut PgConnection, lease: &mut Lease) -> Result<(), DatabaseError> {
    if !lease.is_active {
        return Ok(());
    }
    set_active(txn, lease, false).await
}

/// Reactivate a freed lease. Starting an active lease is a no-op.
pub async fn start(txn: &mut PgConnection, lease: &mut Lease) -> Result<(), DatabaseError> {
    if lease.is_active {
        return Ok(());
    }
    set_active(txn, lease, true).await
}

async fn set_active(
    txn: &mut PgConnection,
    lease: &mut Lease,
    active: bool,
) -> Result<(), DatabaseError> {
    let query = "UPDATE leases SET is_active=$2 WHERE id=$1 RETURNING *";
    let updated: Lease = sqlx::query_as(query)
        .bind(lease.id)
        .bind(active)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    *lease = updated;
    Ok(())
}

/// Stale freed leases: inactive and begun longer ago than the configured
/// lifetime. Selection only — deleting them belongs to the periodic
/// cleanup job. A missing lifetime is a configuration error and surfaces
/// here, at the moment the value is needed.
pub async fn expired(
    txn: &mut PgConnection,
    settings: &Settings,
) -> Result<Vec<Lease>, DatabaseError> {
    let live_time = settings.lease_live_time()?;
    let live_time = chrono::Duration::from_std(live_time)
        .map_err(|e| DatabaseError::internal(format!("lease_live_time out of range: {e}")))?;
    let cutoff = Utc::now() - live_time;

    let query = "SELECT * FROM leases WHERE NOT is_active AND lease_time < $1";
    sqlx::query_as(query)
        .bind(cutoff)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}
