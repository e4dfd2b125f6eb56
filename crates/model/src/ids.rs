/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

#[derive(thiserror::Error, Debug)]
pub enum IdParseError {
    #[error("{value:?} is not a valid {ty}")]
    InvalidUuid { ty: &'static str, value: String },
}

/// Strongly typed UUID of a registered network, usable anywhere a plain
/// UUID is: bound to sqlx queries, serialized, parsed from display form.
/// Keeping network and lease identifiers as distinct types stops them from
/// being swapped in a query bind list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, Hash, PartialEq, FromRow, Type)]
#[sqlx(type_name = "UUID")]
#[repr(transparent)]
pub struct NetworkId(pub uuid::Uuid);

impl From<NetworkId> for uuid::Uuid {
    fn from(id: NetworkId) -> Self {
        id.0
    }
}

impl From<uuid::Uuid> for NetworkId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for NetworkId {
    type Err = IdParseError;
    fn from_str(input: &str) -> Result<Self, IdParseError> {
        Ok(Self(uuid::Uuid::parse_str(input).map_err(|_| {
            IdParseError::InvalidUuid {
                ty: "NetworkId",
                value: input.to_string(),
            }
        })?))
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Strongly typed UUID of a lease row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, Hash, PartialEq, FromRow, Type)]
#[sqlx(type_name = "UUID")]
#[repr(transparent)]
pub struct LeaseId(pub uuid::Uuid);

impl From<LeaseId> for uuid::Uuid {
    fn from(id: LeaseId) -> Self {
        id.0
    }
}

impl From<uuid::Uuid> for LeaseId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for LeaseId {
    type Err = IdParseError;
    fn from_str(input: &str) -> Result<Self, IdParseError> {
        Ok(Self(uuid::Uuid::parse_str(input).map_err(|_| {
            IdParseError::InvalidUuid {
                ty: "LeaseId",
                value: input.to_string(),
            }
        })?))
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}
