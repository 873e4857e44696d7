// ABOUTME: Per-platform OAuth client credentials loaded from the environment
// ABOUTME: A platform missing its client id or secret is unconfigured, never half-configured
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::errors::{AppError, AppResult};
use crate::models::Platform;
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;

/// Environment variable names for one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformEnvNames {
    /// Client id variable
    pub client_id: &'static str,
    /// Client secret variable
    pub client_secret: &'static str,
    /// Redirect URI variable
    pub redirect_uri: &'static str,
    /// Comma-separated scope override variable
    pub scopes: &'static str,
}

impl PlatformEnvNames {
    /// Variable names used for `platform`
    #[must_use]
    pub const fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::TikTok => Self {
                client_id: "TIKTOK_CLIENT_KEY",
                client_secret: "TIKTOK_CLIENT_SECRET",
                redirect_uri: "TIKTOK_REDIRECT_URI",
                scopes: "TIKTOK_SCOPES",
            },
            Platform::YouTube => Self {
                client_id: "YOUTUBE_CLIENT_ID",
                client_secret: "YOUTUBE_CLIENT_SECRET",
                redirect_uri: "YOUTUBE_REDIRECT_URI",
                scopes: "YOUTUBE_SCOPES",
            },
            Platform::Facebook => Self {
                client_id: "FACEBOOK_APP_ID",
                client_secret: "FACEBOOK_APP_SECRET",
                redirect_uri: "FACEBOOK_REDIRECT_URI",
                scopes: "FACEBOOK_SCOPES",
            },
        }
    }
}

/// OAuth client registration for one platform
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    /// Platform this registration belongs to
    pub platform: Platform,
    /// Client id (TikTok client key, Facebook app id)
    pub client_id: Option<String>,
    /// Client secret
    pub client_secret: Option<String>,
    /// Registered redirect URI
    pub redirect_uri: String,
    /// Requested scopes; empty means the platform defaults
    pub scopes: Vec<String>,
}

impl fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("platform", &self.platform)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.secret_fingerprint())
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl OAuthClientConfig {
    /// Registration with no credentials and the default redirect URI under `base_url`
    #[must_use]
    pub fn unconfigured(platform: Platform, base_url: &str) -> Self {
        Self {
            platform,
            client_id: None,
            client_secret: None,
            redirect_uri: format!(
                "{}/api/oauth/{}/callback",
                base_url.trim_end_matches('/'),
                platform.slug()
            ),
            scopes: Vec::new(),
        }
    }

    /// Load the registration for `platform`; the redirect URI defaults under `base_url`
    #[must_use]
    pub fn from_env(platform: Platform, base_url: &str) -> Self {
        let names = PlatformEnvNames::for_platform(platform);
        let defaults = Self::unconfigured(platform, base_url);
        let redirect_uri = non_empty_var(names.redirect_uri).unwrap_or(defaults.redirect_uri);
        let scopes = non_empty_var(names.scopes)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|scope| !scope.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            platform,
            client_id: non_empty_var(names.client_id),
            client_secret: non_empty_var(names.client_secret),
            redirect_uri,
            scopes,
        }
    }

    /// Whether both the client id and secret are present
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Client id and secret
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` naming the missing variables
    pub fn credentials(&self) -> AppResult<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            (id, secret) => {
                let names = PlatformEnvNames::for_platform(self.platform);
                let missing: Vec<&str> = [
                    id.is_none().then_some(names.client_id),
                    secret.is_none().then_some(names.client_secret),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(AppError::config(format!(
                    "{} is not configured: set {}",
                    self.platform.display_name(),
                    missing.join(" and ")
                )))
            }
        }
    }

    /// Short SHA-256 fingerprint of the client secret, safe to log
    #[must_use]
    pub fn secret_fingerprint(&self) -> Option<String> {
        self.client_secret.as_ref().map(|secret| {
            let digest = Sha256::digest(secret.as_bytes());
            hex::encode(&digest[..4])
        })
    }
}
