// ABOUTME: Linked account credential record persisted per (external account id, platform)
// ABOUTME: Token update payloads and upsert outcome used by the credential store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::Platform;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One linked account on one platform
///
/// Identity is `(external_account_id, platform)`; the store keeps at most one
/// record per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Platform-side account id (TikTok open_id, YouTube channel id, Facebook page id)
    pub external_account_id: String,
    /// Platform the account lives on
    pub platform: Platform,
    /// Current access token
    #[serde(skip_serializing)]
    pub access_token: String,
    /// Refresh token, if the platform issued one
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Account display name
    pub display_name: String,
    /// Account avatar URL
    pub avatar_url: Option<String>,
    /// Granted scopes as returned by the platform
    pub scope: Option<String>,
    /// First link time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Whether the access token must be refreshed before use at `now`
    ///
    /// A missing expiry counts as stale.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at
            .map_or(true, |expires_at| now >= expires_at - skew)
    }
}

/// New token material from a refresh grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdate {
    /// Replacement access token
    pub access_token: String,
    /// Replacement refresh token; `None` keeps the stored one
    pub refresh_token: Option<String>,
    /// New expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Newly granted scope, if reported
    pub scope: Option<String>,
}

/// Result of a credential upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed for the pair
    Inserted,
    /// An existing record was updated in place
    Updated,
}

impl UpsertOutcome {
    /// Whether the upsert created the record
    #[must_use]
    pub const fn is_new(self) -> bool {
        matches!(self, Self::Inserted)
    }
}
