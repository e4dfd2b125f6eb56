/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

//! Postgres persistence for the address registry: store functions for
//! networks and leases, the pool allocator, and embedded schema
//! migrations.
//!
//! Store functions take `&mut PgConnection` rather than a pool so the
//! caller decides the transaction scope; [`Transaction`] wraps begin and
//! commit for the common cases, including a nested (savepoint) begin on an
//! existing connection.

use std::net::IpAddr;

use model::network::{AddressOutsideNetwork, NetworkValidationError};
use model::settings::SettingsError;
use sqlx::{Connection, PgConnection, PgPool, Postgres};

pub mod ip_allocator;
pub mod lease;
pub mod migrations;
pub mod network;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("query '{query}' failed: {source}")]
    Query {
        query: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("could not acquire a database connection: {0}")]
    Acquire(#[source] sqlx::Error),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("{kind} with id {id} not found")]
    NotFoundError { kind: &'static str, id: String },
    #[error("{kind} {id} already exists")]
    AlreadyFoundError { kind: &'static str, id: String },
    /// The address is leased already. Two callers computed the same free
    /// address and this one lost the race; recompute and re-register
    /// instead of treating it as fatal.
    #[error("address {0} is already leased")]
    DuplicateAddress(IpAddr),
    #[error(transparent)]
    Validation(#[from] NetworkValidationError),
    #[error(transparent)]
    OutsideNetwork(#[from] AddressOutsideNetwork),
    #[error(transparent)]
    Configuration(#[from] SettingsError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DatabaseError {
    pub fn query(query: &str, error: sqlx::Error) -> Self {
        DatabaseError::Query {
            query: query.to_string(),
            source: error,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DatabaseError::Internal(message.into())
    }

    /// Whether this is the lost-the-allocation-race signal a caller should
    /// respond to by recomputing the first free address.
    pub fn is_duplicate_address(&self) -> bool {
        matches!(self, DatabaseError::DuplicateAddress(_))
    }
}

/// An open transaction. Store functions only see `&mut PgConnection`, so
/// several of them can be composed into one transaction and committed (or
/// dropped, which rolls back) together.
pub struct Transaction<'c> {
    inner: sqlx::Transaction<'c, Postgres>,
}

impl<'c> Transaction<'c> {
    pub async fn begin(pool: &PgPool) -> DatabaseResult<Transaction<'static>> {
        Ok(Transaction {
            inner: pool.begin().await.map_err(DatabaseError::Acquire)?,
        })
    }

    /// Begin a nested (savepoint) transaction on an already-open
    /// connection.
    pub async fn begin_inner(txn: &'c mut PgConnection) -> DatabaseResult<Transaction<'c>> {
        Ok(Transaction {
            inner: txn.begin().await.map_err(DatabaseError::Acquire)?,
        })
    }

    pub fn as_pgconn(&mut self) -> &mut PgConnection {
        &mut self.inner
    }

    pub async fn commit(self) -> DatabaseResult<()> {
        Ok(self.inner.commit().await?)
    }

    pub async fn rollback(self) -> DatabaseResult<()> {
        Ok(self.inner.rollback().await?)
    }
}
