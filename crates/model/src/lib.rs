/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

//! Domain model for the address registry: typed identifiers, the network
//! and lease entities, the field-scoped network validator, and process
//! configuration. Persistence for all of it lives in the `db` crate.

pub mod ids;
pub mod lease;
pub mod network;
pub mod settings;

pub use ids::{IdParseError, LeaseId, NetworkId};
