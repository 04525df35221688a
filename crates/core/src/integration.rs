// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Binding of a project to one external tracker repository.
///
/// At most one active integration exists per project; lookup is always
/// "active integration for project or absent". The token is stored
/// encrypted at rest (see [`crate::secret::TokenCipher`]) and decrypted
/// only when a client is built. Activation and deactivation are owned by
/// the integration-management service; the sync layer only reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationRecord {
    /// Internal primary key.
    pub id: i64,
    pub project_id: i64,
    /// Member whose credential backs this binding, when per-member.
    pub member_id: Option<i64>,
    /// External repository in `owner/name` form.
    pub repository: String,
    /// Encrypted access token (base64 nonce + ciphertext).
    pub token: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl IntegrationRecord {
    /// Split the repository binding into its owner and name parts.
    pub fn repo_parts(&self) -> Result<(&str, &str)> {
        self.repository
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
            .ok_or_else(|| Error::InvalidRepository(self.repository.clone()))
    }
}
