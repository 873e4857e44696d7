// ABOUTME: Account linking flows: start issues a state, complete redeems it and stores credentials
// ABOUTME: Unlink revokes at the platform when supported and removes the stored credential
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::client::{PlatformClients, TokenGrant};
use super::ledger::StateLedger;
use crate::database::CredentialStore;
use crate::errors::{AppError, AppResult};
use crate::models::{CredentialRecord, Platform, StateContext};
use chrono::Utc;
use reelpost_providers::profiles::resolve_identity;
use reelpost_providers::PlatformCapabilities;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Options for starting a link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartLinkOptions {
    /// Caller context returned when the state is redeemed
    pub context: StateContext,
    /// Ask the platform to show the consent screen again
    pub force_consent: bool,
}

/// Data the caller needs to send the user to the platform
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLinkResponse {
    /// Platform authorization URL
    pub auth_url: String,
    /// State token to echo on completion
    pub state: String,
    /// Verifier the caller keeps and presents on completion
    pub code_verifier: String,
}

impl fmt::Debug for StartLinkResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartLinkResponse")
            .field("auth_url", &self.auth_url)
            .field("state", &self.state)
            .field("code_verifier", &"[REDACTED]")
            .finish()
    }
}

/// Callback parameters as received; any may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLinkRequest {
    /// Authorization code
    pub code: Option<String>,
    /// State token
    pub state: Option<String>,
    /// PKCE verifier from `start_link`
    pub code_verifier: Option<String>,
}

/// Outcome of a successful link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLinkResponse {
    /// Platform the account lives on
    pub platform: Platform,
    /// Platform-side account id
    pub account_id: String,
    /// Account display name
    pub display_name: String,
    /// Avatar URL, when the platform exposes one
    pub avatar_url: Option<String>,
    /// Whether this link created a new record
    pub is_new: bool,
    /// Caller context stored at start
    pub context: StateContext,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Orchestrates the linking lifecycle for every platform
pub struct OAuthFlowManager {
    clients: PlatformClients,
    ledger: StateLedger,
    credentials: Arc<dyn CredentialStore>,
}

impl fmt::Debug for OAuthFlowManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthFlowManager")
            .field("clients", &self.clients)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl OAuthFlowManager {
    /// Create a new flow manager
    #[must_use]
    pub fn new(
        clients: PlatformClients,
        ledger: StateLedger,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            clients,
            ledger,
            credentials,
        }
    }

    /// Issue a state and build the authorization URL for `platform`
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the platform has no client credentials,
    /// `DatabaseError` if the state cannot be stored
    pub async fn start_link(
        &self,
        platform: Platform,
        options: StartLinkOptions,
    ) -> AppResult<StartLinkResponse> {
        let client = self.clients.client(platform);
        client.config().credentials()?;

        let issued = self.ledger.create(platform, options.context).await?;
        let auth_url =
            client.authorization_url(&issued.state, &issued.code_challenge, options.force_consent)?;

        Ok(StartLinkResponse {
            auth_url,
            state: issued.state,
            code_verifier: issued.code_verifier,
        })
    }

    /// Redeem the callback, exchange the code, resolve the account, and store it
    ///
    /// # Errors
    ///
    /// - `MissingParameters` if code, state, or verifier is absent
    /// - `ConfigurationError` if the platform has no client credentials
    /// - `NotFound` or `VerifierMismatch` from the ledger
    /// - `ProviderRejected` or `UpstreamError` from the token exchange or profile lookup
    pub async fn complete_link(
        &self,
        platform: Platform,
        request: &CompleteLinkRequest,
    ) -> AppResult<CompleteLinkResponse> {
        let code = present(request.code.as_deref());
        let state = present(request.state.as_deref());
        let verifier = present(request.code_verifier.as_deref());
        let (Some(code), Some(state), Some(verifier)) = (code, state, verifier) else {
            let missing: Vec<&str> = [
                code.is_none().then_some("code"),
                state.is_none().then_some("state"),
                verifier.is_none().then_some("codeVerifier"),
            ]
            .into_iter()
            .flatten()
            .collect();
            return Err(AppError::missing_parameters(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        };

        let client = self.clients.client(platform);
        client.config().credentials()?;

        let context = self.ledger.consume(platform, state, verifier).await?;

        let mut grant = client.exchange_code(code, verifier).await?;
        if client.descriptor().has(PlatformCapabilities::LONG_LIVED_EXCHANGE) {
            let long_lived = client.exchange_long_lived(&grant.access_token).await?;
            grant = TokenGrant {
                account_id: grant.account_id,
                ..long_lived
            };
        }

        let identity = resolve_identity(
            self.clients.transport(),
            client.descriptor(),
            &grant.access_token,
            grant.account_id.as_deref(),
        )
        .await?;

        // A Page token outlives the user token it was read with
        let (access_token, expires_at) = match identity.access_token {
            Some(page_token) => {
                let expires_at = client.token_expiry(&page_token).await?;
                (page_token, expires_at)
            }
            None => (grant.access_token, grant.expires_at),
        };

        let now = Utc::now();
        let record = CredentialRecord {
            external_account_id: identity.external_account_id.clone(),
            platform,
            access_token,
            refresh_token: grant.refresh_token,
            expires_at,
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
            scope: grant.scope,
            created_at: now,
            updated_at: now,
        };
        let outcome = self.credentials.upsert(&record).await?;

        info!(
            platform = %platform,
            account_id = %record.external_account_id,
            is_new = outcome.is_new(),
            "Account linked"
        );

        Ok(CompleteLinkResponse {
            platform,
            account_id: identity.external_account_id,
            display_name: identity.display_name,
            avatar_url: identity.avatar_url,
            is_new: outcome.is_new(),
            context,
        })
    }

    /// Revoke (best effort) and remove a linked account
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is not linked, `DatabaseError` on storage failure
    pub async fn unlink(&self, platform: Platform, account_id: &str) -> AppResult<()> {
        let record = self
            .credentials
            .get(platform, account_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No linked {} account {account_id}",
                    platform.display_name()
                ))
            })?;

        let client = self.clients.client(platform);
        if client.descriptor().has(PlatformCapabilities::TOKEN_REVOCATION)
            && client.config().is_configured()
        {
            let token = record
                .refresh_token
                .as_deref()
                .unwrap_or(&record.access_token);
            if let Err(error) = client.revoke(token).await {
                warn!(
                    platform = %platform,
                    account_id,
                    error = %error,
                    "Token revocation failed; removing the stored credential anyway"
                );
            }
        }

        if !self.credentials.delete(platform, account_id).await? {
            return Err(AppError::not_found(format!(
                "No linked {} account {account_id}",
                platform.display_name()
            )));
        }
        info!(platform = %platform, account_id, "Account unlinked");
        Ok(())
    }
}
