// ABOUTME: Guarantees a usable access token before any upload begins
// ABOUTME: Refreshes tokens inside the expiry skew window and persists the new material
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::constants::oauth::REFRESH_SKEW_SECS;
use crate::database::CredentialStore;
use crate::errors::{AppError, AppResult};
use crate::models::{CredentialRecord, TokenUpdate};
use crate::oauth2_client::PlatformClients;
use chrono::{Duration, Utc};
use reelpost_providers::PlatformCapabilities;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Refreshes stale credentials on demand
pub struct TokenFreshnessGuard {
    clients: PlatformClients,
    credentials: Arc<dyn CredentialStore>,
    skew: Duration,
}

impl fmt::Debug for TokenFreshnessGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenFreshnessGuard")
            .field("skew_secs", &self.skew.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenFreshnessGuard {
    /// Guard with the default refresh skew
    #[must_use]
    pub fn new(clients: PlatformClients, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            clients,
            credentials,
            skew: Duration::seconds(REFRESH_SKEW_SECS),
        }
    }

    /// Access token for `record`, refreshed first if it expires within the skew
    ///
    /// # Errors
    ///
    /// - `ReauthRequired` if the token is stale and either no refresh token is
    ///   stored or the platform has no refresh grant
    /// - `RefreshFailed` if the platform refuses the refresh grant
    /// - `DatabaseError` if the refreshed tokens cannot be persisted
    pub async fn ensure_fresh(&self, record: &CredentialRecord) -> AppResult<String> {
        if !record.needs_refresh(Utc::now(), self.skew) {
            return Ok(record.access_token.clone());
        }

        let client = self.clients.client(record.platform);
        let refresh_token = record
            .refresh_token
            .as_deref()
            .filter(|_| client.descriptor().has(PlatformCapabilities::REFRESH_TOKEN));
        let Some(refresh_token) = refresh_token else {
            warn!(
                platform = %record.platform,
                account_id = %record.external_account_id,
                "Stale token cannot be refreshed"
            );
            return Err(AppError::reauth_required(format!(
                "{} account {} must be linked again",
                record.platform.display_name(),
                record.external_account_id
            )));
        };

        let grant = client.refresh_token(refresh_token).await?;
        let update = TokenUpdate {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            scope: grant.scope,
        };
        let refreshed = self
            .credentials
            .update_tokens(record.platform, &record.external_account_id, &update)
            .await?;

        info!(
            platform = %record.platform,
            account_id = %record.external_account_id,
            expires_at = ?refreshed.expires_at,
            "Access token refreshed"
        );
        Ok(refreshed.access_token)
    }
}
