// ABOUTME: OAuth 2.0 client with PKCE for TikTok, Google/YouTube, and Facebook
// ABOUTME: Builds authorization URLs and runs code, refresh, long-lived, and revoke grants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::config::{OAuthClientConfig, PlatformCredentials};
use crate::constants::oauth::{CODE_CHALLENGE_METHOD, DEFAULT_TOKEN_EXPIRY_SECS};
use crate::errors::{AppError, AppResult, ProviderError, ProviderResult};
use crate::models::Platform;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use reelpost_providers::{HttpTransport, PlatformDescriptor, TransportRequest, TransportResponse};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// `PKCE` (Proof Key for Code Exchange) parameters for OAuth2 security
#[derive(Clone, PartialEq, Eq)]
pub struct PkceParams {
    /// Random code verifier, base64url without padding
    pub code_verifier: String,
    /// SHA256 hash of code verifier, base64url encoded
    pub code_challenge: String,
}

impl fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// Base64url encoding of `len` bytes from the thread-local CSPRNG
#[must_use]
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `S256` challenge for `code_verifier`
#[must_use]
pub fn code_challenge_for(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

impl PkceParams {
    /// Generate `PKCE` parameters from `entropy_bytes` random bytes
    #[must_use]
    pub fn generate(entropy_bytes: usize) -> Self {
        let code_verifier = random_token(entropy_bytes);
        let code_challenge = code_challenge_for(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

/// Token material returned by a grant
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Access token
    pub access_token: String,
    /// Refresh token, when issued
    pub refresh_token: Option<String>,
    /// Absolute expiry derived from `expires_in`
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scope string
    pub scope: Option<String>,
    /// Account id carried by the token response (TikTok `open_id`)
    pub account_id: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("account_id", &self.account_id)
            .finish()
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// `expires_in` arrives as a number or a numeric string
fn expires_in(raw: &Value) -> Option<i64> {
    match raw.get("expires_in")? {
        Value::String(s) => s.parse().ok(),
        other => other.as_i64(),
    }
}

/// Human-readable reason from the error shapes the three platforms use
fn error_reason(raw: &Value) -> Option<String> {
    match raw.get("error")? {
        Value::String(code) => Some(match string_field(raw, "error_description") {
            Some(description) => format!("{code}: {description}"),
            None => code.clone(),
        }),
        Value::Object(error) => Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("token request failed")
                .to_owned(),
        ),
        _ => None,
    }
}

/// Classify a token endpoint response
///
/// A body with an access token is a grant. A body carrying an error shape is
/// a rejection; a non-2xx status without one is an HTTP failure.
fn parse_token_response(
    provider: &str,
    response: &TransportResponse,
    now: DateTime<Utc>,
) -> ProviderResult<TokenGrant> {
    let raw: Option<Value> = serde_json::from_slice(&response.body).ok();
    let Some(raw) = raw else {
        return Err(if response.is_success() {
            ProviderError::invalid_response(provider, "token response is not JSON")
        } else {
            ProviderError::HttpStatus {
                provider: provider.to_owned(),
                status: response.status,
                body: response.text(),
            }
        });
    };

    if response.is_success() {
        if let Some(access_token) = string_field(&raw, "access_token") {
            let lifetime = expires_in(&raw).unwrap_or(DEFAULT_TOKEN_EXPIRY_SECS);
            return Ok(TokenGrant {
                access_token,
                refresh_token: string_field(&raw, "refresh_token"),
                expires_at: Duration::try_seconds(lifetime)
                    .and_then(|lifetime| now.checked_add_signed(lifetime)),
                scope: string_field(&raw, "scope"),
                account_id: string_field(&raw, "open_id"),
            });
        }
    }

    if let Some(reason) = error_reason(&raw) {
        return Err(ProviderError::rejected(provider, reason, Some(raw)));
    }
    if !response.is_success() {
        return Err(ProviderError::HttpStatus {
            provider: provider.to_owned(),
            status: response.status,
            body: response.text(),
        });
    }
    Err(ProviderError::rejected(
        provider,
        "token endpoint returned no access token",
        Some(raw),
    ))
}

/// Expiry from a Graph `debug_token` payload
///
/// Page tokens report `expires_at = 0` and are bounded only by
/// `data_access_expires_at`; zero in both means no expiry is known.
fn debug_token_expiry(
    provider: &str,
    response: &TransportResponse,
) -> ProviderResult<Option<DateTime<Utc>>> {
    let raw: Value = serde_json::from_slice(&response.body).map_err(|e| {
        ProviderError::invalid_response(provider, format!("debug_token response is not JSON: {e}"))
    })?;
    if !response.is_success() {
        return Err(match error_reason(&raw) {
            Some(reason) => ProviderError::rejected(provider, reason, Some(raw)),
            None => ProviderError::HttpStatus {
                provider: provider.to_owned(),
                status: response.status,
                body: response.text(),
            },
        });
    }
    let Some(data) = raw.get("data") else {
        return Err(ProviderError::invalid_response(
            provider,
            "debug_token response has no data",
        ));
    };
    if data.get("is_valid").and_then(Value::as_bool) == Some(false) {
        return Err(ProviderError::rejected(
            provider,
            "token reported invalid",
            Some(data.clone()),
        ));
    }
    let expiry = ["expires_at", "data_access_expires_at"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_i64))
        .find(|timestamp| *timestamp > 0)
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0));
    Ok(expiry)
}

/// OAuth 2.0 client for one platform
#[derive(Clone)]
pub struct OAuth2Client {
    descriptor: PlatformDescriptor,
    config: OAuthClientConfig,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for OAuth2Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Client")
            .field("platform", &self.descriptor.platform)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuth2Client {
    /// Create a new `OAuth2` client
    #[must_use]
    pub fn new(
        descriptor: PlatformDescriptor,
        config: OAuthClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            descriptor,
            config,
            transport,
        }
    }

    /// Platform endpoints and capabilities
    #[must_use]
    pub const fn descriptor(&self) -> &PlatformDescriptor {
        &self.descriptor
    }

    /// Client registration
    #[must_use]
    pub const fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    fn provider(&self) -> &'static str {
        self.descriptor.platform.slug()
    }

    /// Get authorization `URL` carrying `state` and the `S256` challenge
    ///
    /// The verifier itself never appears in the URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if credentials are missing or the auth URL is invalid
    pub fn authorization_url(
        &self,
        state: &str,
        code_challenge: &str,
        force_consent: bool,
    ) -> AppResult<String> {
        let (client_id, _) = self.config.credentials()?;
        let mut url = Url::parse(&self.descriptor.auth_url).map_err(|e| {
            AppError::config(format!(
                "Invalid {} authorization URL: {e}",
                self.descriptor.platform.display_name()
            ))
        })?;

        {
            let mut query_pairs = url.query_pairs_mut();
            query_pairs
                .append_pair(self.descriptor.client_id_param, client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.descriptor.scope_string(&self.config.scopes))
                .append_pair("state", state)
                .append_pair("code_challenge", code_challenge)
                .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD);
            for (key, value) in self.descriptor.static_auth_params {
                query_pairs.append_pair(key, value);
            }
            if force_consent {
                if let Some((key, value)) = self.descriptor.force_consent_param {
                    query_pairs.append_pair(key, value);
                }
            }
        }

        Ok(url.into())
    }

    async fn token_request(&self, params: Vec<(&'static str, String)>) -> ProviderResult<TokenGrant> {
        let response = self
            .transport
            .execute(TransportRequest::post(self.provider(), &self.descriptor.token_url).form(params))
            .await?;
        parse_token_response(self.provider(), &response, Utc::now())
    }

    /// Exchange authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns `ProviderRejected` when the platform refuses the code or omits
    /// the access token, `UpstreamError` on transport or HTTP failure
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<TokenGrant> {
        let (client_id, client_secret) = self.config.credentials()?;
        let grant = self
            .token_request(vec![
                (self.descriptor.client_id_param, client_id.to_owned()),
                ("client_secret", client_secret.to_owned()),
                ("code", code.to_owned()),
                ("grant_type", "authorization_code".to_owned()),
                ("redirect_uri", self.config.redirect_uri.clone()),
                ("code_verifier", code_verifier.to_owned()),
            ])
            .await?;
        debug!(platform = %self.descriptor.platform, grant = ?grant, "Authorization code exchanged");
        Ok(grant)
    }

    /// Refresh an access token
    ///
    /// # Errors
    ///
    /// Returns `RefreshFailed` carrying the platform payload when the grant is refused
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenGrant> {
        let (client_id, client_secret) = self.config.credentials()?;
        self.token_request(vec![
            (self.descriptor.client_id_param, client_id.to_owned()),
            ("client_secret", client_secret.to_owned()),
            ("grant_type", "refresh_token".to_owned()),
            ("refresh_token", refresh_token.to_owned()),
        ])
        .await
        .map_err(|error| {
            let payload = error.payload();
            let failed = AppError::refresh_failed(format!(
                "{} token refresh failed: {error}",
                self.descriptor.platform.display_name()
            ));
            match payload {
                Some(payload) => failed.with_details(payload),
                None => failed,
            }
        })
    }

    /// Swap a short-lived Facebook user token for a long-lived one
    ///
    /// # Errors
    ///
    /// Returns `ProviderRejected` or `UpstreamError` when the exchange fails
    pub async fn exchange_long_lived(&self, short_lived_token: &str) -> AppResult<TokenGrant> {
        let (client_id, client_secret) = self.config.credentials()?;
        let grant = self
            .token_request(vec![
                ("grant_type", "fb_exchange_token".to_owned()),
                ("client_id", client_id.to_owned()),
                ("client_secret", client_secret.to_owned()),
                ("fb_exchange_token", short_lived_token.to_owned()),
            ])
            .await?;
        debug!(platform = %self.descriptor.platform, expires_at = ?grant.expires_at, "Long-lived token issued");
        Ok(grant)
    }

    /// Expiry the platform reports for `token`
    ///
    /// Used for tokens that do not come from the token endpoint, such as a
    /// Facebook Page token. Platforms without an introspection endpoint
    /// report `None`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderRejected` when the platform reports the token invalid,
    /// `UpstreamError` on transport or HTTP failure
    pub async fn token_expiry(&self, token: &str) -> AppResult<Option<DateTime<Utc>>> {
        let Some(debug_url) = &self.descriptor.token_debug_url else {
            return Ok(None);
        };
        let (client_id, client_secret) = self.config.credentials()?;
        let response = self
            .transport
            .execute(TransportRequest::get(self.provider(), debug_url).query([
                ("input_token", token.to_owned()),
                ("access_token", format!("{client_id}|{client_secret}")),
            ]))
            .await?;
        let expires_at = debug_token_expiry(self.provider(), &response)?;
        debug!(platform = %self.descriptor.platform, expires_at = ?expires_at, "Token expiry inspected");
        Ok(expires_at)
    }

    /// Revoke `token` at the platform, if it supports revocation
    ///
    /// # Errors
    ///
    /// Returns `ProviderRejected` or `UpstreamError` when the platform refuses
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        let Some(revoke_url) = &self.descriptor.revoke_url else {
            return Ok(());
        };
        let params: Vec<(&str, String)> = match self.descriptor.platform {
            Platform::TikTok => {
                let (client_id, client_secret) = self.config.credentials()?;
                vec![
                    ("client_key", client_id.to_owned()),
                    ("client_secret", client_secret.to_owned()),
                    ("token", token.to_owned()),
                ]
            }
            Platform::YouTube | Platform::Facebook => vec![("token", token.to_owned())],
        };
        let response = self
            .transport
            .execute(TransportRequest::post(self.provider(), revoke_url).form(params))
            .await?;
        if let Err(error) = response.error_for_status(self.provider()) {
            warn!(platform = %self.descriptor.platform, error = %error, "Token revocation refused");
            return Err(error.into());
        }
        Ok(())
    }
}

/// Builds per-platform clients from the configured registrations
#[derive(Clone)]
pub struct PlatformClients {
    platforms: PlatformCredentials,
    graph_version: String,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for PlatformClients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformClients")
            .field("platforms", &self.platforms)
            .field("graph_version", &self.graph_version)
            .finish_non_exhaustive()
    }
}

impl PlatformClients {
    /// Clients over `transport` using `platforms` registrations
    #[must_use]
    pub fn new(
        platforms: PlatformCredentials,
        graph_version: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            platforms,
            graph_version: graph_version.into(),
            transport,
        }
    }

    /// Endpoints and capabilities of `platform`
    #[must_use]
    pub fn descriptor(&self, platform: Platform) -> PlatformDescriptor {
        PlatformDescriptor::for_platform(platform, &self.graph_version)
    }

    /// OAuth client for `platform`
    #[must_use]
    pub fn client(&self, platform: Platform) -> OAuth2Client {
        OAuth2Client::new(
            self.descriptor(platform),
            self.platforms.get(platform).clone(),
            Arc::clone(&self.transport),
        )
    }

    /// Shared transport
    #[must_use]
    pub fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }
}
