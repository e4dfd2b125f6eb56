/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */
use model::NetworkId;
use model::network::{Network, NetworkDraft};
use sqlx::PgConnection;

use super::DatabaseError;

/*
 * Registering or editing a block always revalidates the draft against
 * every other registered block inside the caller's transaction. The
 * overlap scan and the write seeing the same snapshot is what upholds the
 * no-overlap invariant; there is no other guard.
 */

/// Validate `draft` against all registered blocks and insert it.
pub async fn create(
    txn: &mut PgConnection,
    draft: &NetworkDraft,
) -> Result<Network, DatabaseError> {
    let rivals = find_all(&mut *txn).await?;
    let new = draft.validate(&rivals)?;

    let query = "INSERT INTO networks (id, network, kind, description, ip_start, ip_end)
            VALUES ($1::uuid, $2::cidr, $3, $4, $5::inet, $6::inet)
            RETURNING *";
    match sqlx::query_as(query)
        .bind(NetworkId::from(uuid::Uuid::new_v4()))
        .bind(new.network)
        .bind(new.kind)
        .bind(&new.description)
        .bind(new.ip_start)
        .bind(new.ip_end)
        .fetch_one(txn)
        .await
    {
        Ok(network) => Ok(network),
        // Identical CIDR raced past the overlap scan in another
        // transaction; the unique index on the column is the backstop.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(DatabaseError::AlreadyFoundError {
                kind: "network",
                id: new.network.to_string(),
            })
        }
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}

/// Revalidate and update an existing block. The overlap scan excludes the
/// block itself so an edit does not collide with its own row.
pub async fn update(
    txn: &mut PgConnection,
    id: NetworkId,
    draft: &NetworkDraft,
) -> Result<Network, DatabaseError> {
    let rivals = find_others(&mut *txn, id).await?;
    let new = draft.validate(&rivals)?;

    let query = "UPDATE networks
            SET network=$2::cidr, kind=$3, description=$4, ip_start=$5::inet, ip_end=$6::inet
            WHERE id=$1
            RETURNING *";
    match sqlx::query_as(query)
        .bind(id)
        .bind(new.network)
        .bind(new.kind)
        .bind(&new.description)
        .bind(new.ip_start)
        .bind(new.ip_end)
        .fetch_one(txn)
        .await
    {
        Ok(network) => Ok(network),
        Err(sqlx::Error::RowNotFound) => Err(DatabaseError::NotFoundError {
            kind: "network",
            id: id.to_string(),
        }),
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}

pub async fn find(txn: &mut PgConnection, id: NetworkId) -> Result<Network, DatabaseError> {
    let query = "SELECT * FROM networks WHERE id=$1";
    match sqlx::query_as(query).bind(id).fetch_one(txn).await {
        Ok(network) => Ok(network),
        Err(sqlx::Error::RowNotFound) => Err(DatabaseError::NotFoundError {
            kind: "network",
            id: id.to_string(),
        }),
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}

/// All registered blocks, ordered by CIDR.
pub async fn find_all(txn: &mut PgConnection) -> Result<Vec<Network>, DatabaseError> {
    let query = "SELECT * FROM networks ORDER BY network";
    sqlx::query_as(query)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Every registered block except `id`: the rival set a draft is validated
/// against when editing. Ordered by CIDR so the first reported overlap is
/// deterministic.
pub async fn find_others(
    txn: &mut PgConnection,
    id: NetworkId,
) -> Result<Vec<Network>, DatabaseError> {
    let query = "SELECT * FROM networks WHERE id <> $1 ORDER BY network";
    sqlx::query_as(query)
        .bind(id)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Delete a block. Its leases go with it (FK cascade).
pub async fn delete(txn: &mut PgConnection, id: NetworkId) -> Result<(), DatabaseError> {
    let query = "DELETE FROM networks WHERE id=$1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFoundError {
            kind: "network",
            id: id.to_string(),
        });
    }
    Ok(())
}
