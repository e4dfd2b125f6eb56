/*
 * SPDX-FileCopyrightText: Copyright (c) 2025-2026 ippool contributors
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use duration_str::deserialize_option_duration;
use serde::Deserialize;

/// Process-wide pool configuration, deserialized from TOML by whatever
/// binary embeds this library.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// How long a freed lease is held before the expiry query offers it
    /// up for collection, as a human-readable duration (`"14d"`,
    /// `"12h30m"`). Optional here so a deployment that never runs expiry
    /// does not have to invent a value; the expiry query itself treats
    /// absence as fatal.
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub lease_live_time: Option<Duration>,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// The configured lease lifetime. Absence is a configuration error,
    /// surfaced the moment expiry is requested rather than as an empty
    /// result set.
    pub fn lease_live_time(&self) -> Result<Duration, SettingsError> {
        self.lease_live_time.ok_or(SettingsError::LeaseLiveTimeUnset)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("lease_live_time is not configured")]
    LeaseLiveTimeUnset,
    #[error("malformed settings: {0}")]
    Parse(#[from] toml::de::Error),
}
