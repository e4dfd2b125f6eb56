/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use ippool_net::AddressScope;

use crate::ids::NetworkId;

/// Upper bound on the human label of a network; the column is VARCHAR(64).
pub const DESCRIPTION_MAX_CHARS: usize = 64;

/// Routing classification of a registered block. Determines which pool a
/// subscriber or device draws from; the allocator itself is kind-agnostic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[sqlx(type_name = "network_kind")]
pub enum NetworkKind {
    /// Public addresses routed out to subscribers.
    #[sqlx(rename = "inet")]
    #[strum(serialize = "inet")]
    Internet,
    /// Pre-authentication holding pool.
    #[default]
    #[sqlx(rename = "guest")]
    #[strum(serialize = "guest")]
    Guest,
    /// Authenticated subscriber pool.
    #[sqlx(rename = "trust")]
    #[strum(serialize = "trust")]
    Trusted,
    /// Managed infrastructure gear (switches, ONUs).
    #[sqlx(rename = "device")]
    #[strum(serialize = "device")]
    Device,
    /// Staff and management addresses.
    #[sqlx(rename = "admin")]
    #[strum(serialize = "admin")]
    Admin,
}

/// A registered address block: a CIDR plus the usable sub-range the
/// allocator hands addresses out of. Registered blocks never overlap; the
/// validator below is the sole guarantor of that invariant and runs inside
/// the same transaction as every create and update.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Network {
    pub id: NetworkId,
    pub network: IpNetwork,
    pub kind: NetworkKind,
    pub description: String,
    /// Lower bound of the usable range, inside `network`.
    pub ip_start: IpAddr,
    /// Upper bound of the usable range, inclusive, inside `network`.
    pub ip_end: IpAddr,
    pub created: DateTime<Utc>,
}

impl Network {
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.network.contains(ip)
    }

    /// Containment invariant for leases: every lease must lie inside its
    /// owning block.
    pub fn ensure_contains(&self, ip: IpAddr) -> Result<(), AddressOutsideNetwork> {
        if self.contains(ip) {
            Ok(())
        } else {
            Err(AddressOutsideNetwork {
                ip,
                network: self.network,
            })
        }
    }

    /// Where in the address space this block lives, for listings.
    pub fn scope(&self) -> AddressScope {
        ippool_net::scope(&self.network)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description, self.network)
    }
}

/// A fully parsed and validated block registration, ready to persist.
/// Only [`NetworkDraft::validate`] produces these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNetwork {
    pub network: IpNetwork,
    pub kind: NetworkKind,
    pub description: String,
    pub ip_start: IpAddr,
    pub ip_end: IpAddr,
}

/// Raw administrator input for registering or editing a block, with the
/// CIDR and range bounds still in textual form.
#[derive(Debug, Clone)]
pub struct NetworkDraft {
    pub network: String,
    pub kind: NetworkKind,
    pub description: String,
    pub ip_start: String,
    pub ip_end: String,
}

impl NetworkDraft {
    /// Validate the draft against the other registered blocks and produce
    /// the typed registration.
    ///
    /// Checks run in a fixed order. A CIDR or range bound that does not
    /// parse stops validation at that field; the two range containment
    /// checks are independent and failures are reported together, along
    /// with an inverted range and an oversized description. The overlap
    /// scan runs last, only on an otherwise valid draft, and reports the
    /// first of `others` that overlaps the candidate CIDR. `others` must
    /// already exclude the block being edited, or an update would collide
    /// with itself.
    pub fn validate<'a, I>(&self, others: I) -> Result<NewNetwork, NetworkValidationError>
    where
        I: IntoIterator<Item = &'a Network>,
    {
        let Ok(network) = IpNetwork::from_str(self.network.trim()) else {
            return Err(NetworkFieldError::MalformedNetwork.into());
        };
        let Ok(ip_start) = IpAddr::from_str(self.ip_start.trim()) else {
            return Err(NetworkFieldError::MalformedIpStart.into());
        };

        let mut errors = Vec::new();
        if !network.contains(ip_start) {
            errors.push(NetworkFieldError::IpStartOutsideNetwork(ip_start, network));
        }
        let Ok(ip_end) = IpAddr::from_str(self.ip_end.trim()) else {
            errors.push(NetworkFieldError::MalformedIpEnd);
            return Err(NetworkValidationError { errors });
        };
        if !network.contains(ip_end) {
            errors.push(NetworkFieldError::IpEndOutsideNetwork(ip_end, network));
        }
        if errors.is_empty() && ip_start > ip_end {
            errors.push(NetworkFieldError::EmptyRange {
                start: ip_start,
                end: ip_end,
            });
        }
        let description = self.description.trim();
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(NetworkFieldError::DescriptionTooLong);
        }
        if !errors.is_empty() {
            return Err(NetworkValidationError { errors });
        }

        for other in others {
            if ippool_net::overlaps(&network, &other.network) {
                return Err(NetworkFieldError::OverlapsExisting(other.network).into());
            }
        }

        Ok(NewNetwork {
            network,
            kind: self.kind,
            description: description.to_string(),
            ip_start,
            ip_end,
        })
    }
}

/// A single field-scoped complaint about a draft.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkFieldError {
    #[error("network is not a valid CIDR block")]
    MalformedNetwork,
    #[error("start of the usable range is not a valid address")]
    MalformedIpStart,
    #[error("end of the usable range is not a valid address")]
    MalformedIpEnd,
    #[error("usable range start {0} is outside {1}")]
    IpStartOutsideNetwork(IpAddr, IpNetwork),
    #[error("usable range end {0} is outside {1}")]
    IpEndOutsideNetwork(IpAddr, IpNetwork),
    #[error("usable range start {start} is past its end {end}")]
    EmptyRange { start: IpAddr, end: IpAddr },
    #[error("description is longer than {DESCRIPTION_MAX_CHARS} characters")]
    DescriptionTooLong,
    #[error("network overlaps with {0}")]
    OverlapsExisting(IpNetwork),
}

impl NetworkFieldError {
    /// The form field the complaint belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            NetworkFieldError::MalformedNetwork | NetworkFieldError::OverlapsExisting(_) => {
                "network"
            }
            NetworkFieldError::MalformedIpStart
            | NetworkFieldError::IpStartOutsideNetwork(..) => "ip_start",
            NetworkFieldError::MalformedIpEnd
            | NetworkFieldError::IpEndOutsideNetwork(..)
            | NetworkFieldError::EmptyRange { .. } => "ip_end",
            NetworkFieldError::DescriptionTooLong => "description",
        }
    }
}

/// Everything wrong with a draft, in check order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct NetworkValidationError {
    pub errors: Vec<NetworkFieldError>,
}

impl From<NetworkFieldError> for NetworkValidationError {
    fn from(error: NetworkFieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// A lease creation pointing outside the owning block.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("address {ip} is outside network {network}")]
pub struct AddressOutsideNetwork {
    pub ip: IpAddr,
    pub network: IpNetwork,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(network: &str, ip_start: &str, ip_end: &str) -> NetworkDraft {
        NetworkDraft {
            network: network.to_string(),
            kind: NetworkKind::Guest,
            description: "test pool".to_string(),
            ip_start: ip_start.to_string(),
            ip_end: ip_end.to_string(),
        }
    }

    fn registered(cidr: &str) -> Network {
        let network: IpNetwork = cidr.parse().expect("fixture CIDR must parse");
        Network {
            id: NetworkId::from(uuid::Uuid::new_v4()),
            network,
            kind: NetworkKind::Internet,
            description: "already registered".to_string(),
            ip_start: network.network(),
            ip_end: network.broadcast(),
            created: Utc::now(),
        }
    }

    fn fields(err: &NetworkValidationError) -> Vec<&'static str> {
        err.errors.iter().map(NetworkFieldError::field).collect()
    }

    #[test]
    fn test_valid_draft_parses_fields() {
        let new = draft(" 192.168.1.0/24 ", "192.168.1.10", "192.168.1.20")
            .validate([])
            .expect("draft must validate");
        assert_eq!(new.network.to_string(), "192.168.1.0/24");
        assert_eq!(new.ip_start.to_string(), "192.168.1.10");
        assert_eq!(new.ip_end.to_string(), "192.168.1.20");
        assert_eq!(new.kind, NetworkKind::Guest);
    }

    #[test]
    fn test_malformed_network_short_circuits() {
        let err = draft("10.0.0.0/33", "junk", "more junk")
            .validate([])
            .expect_err("bad CIDR must fail");
        assert_eq!(err.errors, vec![NetworkFieldError::MalformedNetwork]);
    }

    #[test]
    fn test_malformed_start_short_circuits() {
        let err = draft("10.0.0.0/24", "10.0.0.", "junk")
            .validate([])
            .expect_err("bad start must fail");
        assert_eq!(err.errors, vec![NetworkFieldError::MalformedIpStart]);
    }

    #[test]
    fn test_bounds_outside_reported_together() {
        let err = draft("10.0.0.0/24", "10.0.1.5", "10.0.2.7")
            .validate([])
            .expect_err("out-of-block bounds must fail");
        assert_eq!(fields(&err), vec!["ip_start", "ip_end"]);
    }

    #[test]
    fn test_malformed_end_keeps_start_complaint() {
        let err = draft("10.0.0.0/24", "10.0.1.5", "junk")
            .validate([])
            .expect_err("must fail");
        assert_eq!(
            err.errors,
            vec![
                NetworkFieldError::IpStartOutsideNetwork(
                    "10.0.1.5".parse().unwrap(),
                    "10.0.0.0/24".parse().unwrap(),
                ),
                NetworkFieldError::MalformedIpEnd,
            ]
        );
    }

    #[test]
    fn test_mixed_family_bounds_are_outside() {
        let err = draft("10.0.0.0/24", "2001:db8::1", "10.0.0.20")
            .validate([])
            .expect_err("v6 bound in a v4 block must fail");
        assert_eq!(fields(&err), vec!["ip_start"]);
    }

    #[test]
    fn test_inverted_range() {
        let err = draft("10.0.0.0/24", "10.0.0.20", "10.0.0.10")
            .validate([])
            .expect_err("inverted range must fail");
        assert_eq!(
            err.errors,
            vec![NetworkFieldError::EmptyRange {
                start: "10.0.0.20".parse().unwrap(),
                end: "10.0.0.10".parse().unwrap(),
            }]
        );
        assert_eq!(fields(&err), vec!["ip_end"]);
    }

    #[test]
    fn test_single_address_range_is_valid() {
        draft("10.0.0.0/24", "10.0.0.10", "10.0.0.10")
            .validate([])
            .expect("single-address range must validate");
    }

    #[test]
    fn test_description_too_long() {
        let mut d = draft("10.0.0.0/24", "10.0.0.10", "10.0.0.20");
        d.description = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
        let err = d.validate([]).expect_err("oversized description must fail");
        assert_eq!(err.errors, vec![NetworkFieldError::DescriptionTooLong]);
    }

    #[test]
    fn test_overlap_reports_first_rival() {
        let rivals = [registered("10.0.0.0/24"), registered("10.1.0.0/16")];
        let err = draft("10.0.0.128/25", "10.0.0.130", "10.0.0.140")
            .validate(&rivals)
            .expect_err("overlapping draft must fail");
        assert_eq!(
            err.errors,
            vec![NetworkFieldError::OverlapsExisting(
                "10.0.0.0/24".parse().unwrap()
            )]
        );
        assert_eq!(fields(&err), vec!["network"]);
    }

    #[test]
    fn test_disjoint_rivals_pass() {
        let rivals = [registered("10.0.0.0/24"), registered("fd00::/64")];
        draft("10.0.1.0/24", "10.0.1.10", "10.0.1.20")
            .validate(&rivals)
            .expect("disjoint draft must validate");
    }

    #[test]
    fn test_overlap_runs_only_on_structurally_valid_drafts() {
        // A draft with a bad range must not reach the overlap scan and
        // report a confusing second error.
        let rivals = [registered("10.0.0.0/24")];
        let err = draft("10.0.0.0/25", "10.0.0.200", "10.0.0.210")
            .validate(&rivals)
            .expect_err("must fail on the range first");
        assert_eq!(fields(&err), vec!["ip_start", "ip_end"]);
    }

    #[test]
    fn test_kind_string_forms() {
        assert_eq!(NetworkKind::Trusted.to_string(), "trust");
        assert_eq!(
            "inet".parse::<NetworkKind>().expect("kind must parse"),
            NetworkKind::Internet
        );
        assert!("internet".parse::<NetworkKind>().is_err());
        assert_eq!(NetworkKind::default(), NetworkKind::Guest);
    }

    #[test]
    fn test_network_display() {
        let mut network = registered("192.168.1.0/24");
        network.description = "office".to_string();
        assert_eq!(network.to_string(), "office: 192.168.1.0/24");
    }

    #[test]
    fn test_ensure_contains() {
        let network = registered("192.168.1.0/24");
        network
            .ensure_contains("192.168.1.77".parse().unwrap())
            .expect("address inside the block");
        let err = network
            .ensure_contains("192.168.2.1".parse().unwrap())
            .expect_err("address outside the block");
        assert_eq!(err.network, network.network);
    }

    #[test]
    fn test_scope_accessor() {
        assert_eq!(
            registered("192.168.1.0/24").scope(),
            ippool_net::AddressScope::Private
        );
    }
}
