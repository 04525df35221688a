// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, loaded from a TOML file. Every field has a
//! default so an empty file (or none at all) is valid.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use tether_core::Error;

use crate::outbox::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Base URL of the tracker API.
    pub api_base: String,
    /// Per-request HTTP timeout.
    pub http_timeout_secs: u64,
    /// How often the worker polls the outbox for due jobs.
    pub poll_interval_ms: u64,
    /// Maximum jobs drained per poll.
    pub batch_size: usize,
    /// Attempts before a job is dropped.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each failure.
    pub initial_delay_ms: u64,
    /// Ceiling on the retry delay.
    pub max_delay_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            http_timeout_secs: 30,
            poll_interval_ms: 2000,
            batch_size: 32,
            max_attempts: 8,
            initial_delay_ms: 500,
            max_delay_secs: 300,
        }
    }
}

impl SyncConfig {
    /// Parse a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay_ms: self.initial_delay_ms,
            max_delay_secs: self.max_delay_secs,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
