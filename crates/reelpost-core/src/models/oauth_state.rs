// ABOUTME: OAuth state ledger record correlating a CSRF state with a PKCE verifier
// ABOUTME: Caller context returned on redemption and the verifier-mismatch policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optional caller-supplied context stored alongside a state token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateContext {
    /// Caller's user identifier
    pub user_id: Option<String>,
    /// Caller's workspace identifier
    pub workspace_id: Option<String>,
}

/// Server-held record for one in-flight linking flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStateRecord {
    /// Opaque random state token (primary key)
    pub state: String,
    /// Platform whose callback may redeem this state
    pub platform: Platform,
    /// PKCE code verifier
    pub code_verifier: String,
    /// PKCE code challenge derived from the verifier
    pub code_challenge: String,
    /// Caller context
    pub context: StateContext,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether the state has been redeemed
    pub used: bool,
    /// Redemption time
    pub used_at: Option<DateTime<Utc>>,
}

/// What a verifier mismatch does to the state being redeemed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Verify first; a mismatch leaves the state redeemable until it expires
    #[default]
    Retain,
    /// Mark used first; a mismatch permanently invalidates the state
    Burn,
}

impl fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retain => f.write_str("retain"),
            Self::Burn => f.write_str("burn"),
        }
    }
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "burn" => Ok(Self::Burn),
            other => Err(format!("unknown mismatch policy: {other}")),
        }
    }
}
