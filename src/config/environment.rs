// ABOUTME: Environment-only server configuration with validation at startup
// ABOUTME: HTTP binding, database URL, OAuth ledger policy, platform credentials, upload tuning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::oauth::OAuthClientConfig;
use crate::constants::endpoints::facebook;
use crate::constants::oauth::{MAX_STATE_TTL_SECS, STATE_TTL_SECS};
use crate::constants::uploads::{
    DEFAULT_MAX_UPLOAD_BYTES, FACEBOOK_DEFAULT_CHUNK_SIZE, TIKTOK_MAX_POLL_ATTEMPTS,
    TIKTOK_POLL_INTERVAL_SECS,
};
use crate::models::{MismatchPolicy, Platform};
use anyhow::{anyhow, bail, Result};
use reelpost_providers::drivers::TikTokPublishMode;
use reelpost_providers::{ClientTimeouts, UploadSettings};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default sqlite database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/reelpost.db";

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value for {name}: {e}")),
        _ => Ok(default),
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// OAuth state ledger behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OAuthLedgerConfig {
    /// State lifetime
    pub state_ttl: chrono::Duration,
    /// What a verifier mismatch does to the state
    pub mismatch_policy: MismatchPolicy,
}

impl Default for OAuthLedgerConfig {
    fn default() -> Self {
        Self {
            state_ttl: chrono::Duration::seconds(STATE_TTL_SECS),
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

/// OAuth registrations for every platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCredentials {
    /// TikTok registration
    pub tiktok: OAuthClientConfig,
    /// Google/YouTube registration
    pub youtube: OAuthClientConfig,
    /// Facebook registration
    pub facebook: OAuthClientConfig,
}

impl PlatformCredentials {
    /// Load all three registrations
    #[must_use]
    pub fn from_env(base_url: &str) -> Self {
        Self {
            tiktok: OAuthClientConfig::from_env(Platform::TikTok, base_url),
            youtube: OAuthClientConfig::from_env(Platform::YouTube, base_url),
            facebook: OAuthClientConfig::from_env(Platform::Facebook, base_url),
        }
    }

    /// Registrations with no credentials for any platform
    #[must_use]
    pub fn unconfigured(base_url: &str) -> Self {
        Self {
            tiktok: OAuthClientConfig::unconfigured(Platform::TikTok, base_url),
            youtube: OAuthClientConfig::unconfigured(Platform::YouTube, base_url),
            facebook: OAuthClientConfig::unconfigured(Platform::Facebook, base_url),
        }
    }

    /// Mutable registration for `platform`
    pub fn get_mut(&mut self, platform: Platform) -> &mut OAuthClientConfig {
        match platform {
            Platform::TikTok => &mut self.tiktok,
            Platform::YouTube => &mut self.youtube,
            Platform::Facebook => &mut self.facebook,
        }
    }

    /// Registration for `platform`
    #[must_use]
    pub const fn get(&self, platform: Platform) -> &OAuthClientConfig {
        match platform {
            Platform::TikTok => &self.tiktok,
            Platform::YouTube => &self.youtube,
            Platform::Facebook => &self.facebook,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port
    pub http_port: u16,
    /// Listen address
    pub host: String,
    /// Public base URL used for default redirect URIs
    pub base_url: String,
    /// sqlx database URL
    pub database_url: String,
    /// Ledger behavior
    pub oauth: OAuthLedgerConfig,
    /// Platform registrations
    pub platforms: PlatformCredentials,
    /// Upload driver tuning
    pub uploads: UploadSettings,
    /// Shared HTTP client timeouts
    pub http_client: ClientTimeouts,
    /// Request body ceiling for `/api/uploads`
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let base_url = format!("http://localhost:{DEFAULT_HTTP_PORT}");
        Self {
            http_port: DEFAULT_HTTP_PORT,
            host: "0.0.0.0".to_owned(),
            platforms: PlatformCredentials::unconfigured(&base_url),
            base_url,
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            oauth: OAuthLedgerConfig::default(),
            uploads: UploadSettings::default(),
            http_client: ClientTimeouts::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load and validate configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed
    pub fn from_env() -> Result<Self> {
        let http_port = parse_var("HTTP_PORT", DEFAULT_HTTP_PORT)?;
        let base_url = string_var("BASE_URL", &format!("http://localhost:{http_port}"));

        let ttl_secs: i64 = parse_var("OAUTH_STATE_TTL_SECS", STATE_TTL_SECS)?;
        if ttl_secs > MAX_STATE_TTL_SECS {
            bail!("OAUTH_STATE_TTL_SECS must be at most {MAX_STATE_TTL_SECS}, got {ttl_secs}");
        }
        let state_ttl = chrono::Duration::try_seconds(ttl_secs)
            .ok_or_else(|| anyhow!("OAUTH_STATE_TTL_SECS is out of range: {ttl_secs}"))?;
        let oauth = OAuthLedgerConfig {
            state_ttl,
            mismatch_policy: parse_var("OAUTH_STATE_MISMATCH_POLICY", MismatchPolicy::default())?,
        };

        let uploads = UploadSettings {
            facebook_graph_version: string_var(
                "FACEBOOK_GRAPH_VERSION",
                facebook::DEFAULT_GRAPH_VERSION,
            ),
            tiktok_poll_interval: Duration::from_secs(parse_var(
                "TIKTOK_POLL_INTERVAL_SECS",
                TIKTOK_POLL_INTERVAL_SECS,
            )?),
            tiktok_max_poll_attempts: parse_var(
                "TIKTOK_MAX_POLL_ATTEMPTS",
                TIKTOK_MAX_POLL_ATTEMPTS,
            )?,
            tiktok_publish_mode: parse_var("TIKTOK_PUBLISH_MODE", TikTokPublishMode::default())?,
            ..UploadSettings::default()
        }
        .with_facebook_chunk_size(parse_var(
            "FACEBOOK_CHUNK_SIZE_BYTES",
            FACEBOOK_DEFAULT_CHUNK_SIZE,
        )?);

        let defaults = ClientTimeouts::default();
        let http_client = ClientTimeouts {
            request: Duration::from_secs(parse_var(
                "HTTP_CLIENT_TIMEOUT_SECS",
                defaults.request.as_secs(),
            )?),
            connect: Duration::from_secs(parse_var(
                "HTTP_CLIENT_CONNECT_TIMEOUT_SECS",
                defaults.connect.as_secs(),
            )?),
        };

        let config = Self {
            http_port,
            host: string_var("HOST", "0.0.0.0"),
            platforms: PlatformCredentials::from_env(&base_url),
            base_url,
            database_url: string_var("DATABASE_URL", DEFAULT_DATABASE_URL),
            oauth,
            uploads,
            http_client,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.oauth.state_ttl <= chrono::Duration::zero() {
            bail!("OAUTH_STATE_TTL_SECS must be positive");
        }
        if self.uploads.tiktok_max_poll_attempts == 0 {
            bail!("TIKTOK_MAX_POLL_ATTEMPTS must be at least 1");
        }
        if self.max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be positive");
        }
        if !self.database_url.starts_with("sqlite:") {
            bail!("DATABASE_URL must be a sqlite URL, got {}", self.database_url);
        }
        Ok(())
    }

    /// Platforms with complete OAuth credentials
    #[must_use]
    pub fn configured_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|platform| self.platforms.get(*platform).is_configured())
            .collect()
    }

    /// Log-safe summary of the effective configuration
    #[must_use]
    pub fn summary(&self) -> String {
        let platforms: Vec<String> = Platform::ALL
            .into_iter()
            .map(|platform| {
                let registration = self.platforms.get(platform);
                match registration.secret_fingerprint() {
                    Some(fingerprint) if registration.is_configured() => {
                        format!("{platform}=configured(secret:{fingerprint})")
                    }
                    _ => format!("{platform}=not-configured"),
                }
            })
            .collect();
        format!(
            "listen={}:{} base_url={} database={} state_ttl={}s mismatch_policy={} \
             platforms=[{}] facebook_chunk={}B graph={} tiktok_poll={}s x{} tiktok_mode={}",
            self.host,
            self.http_port,
            self.base_url,
            self.database_url,
            self.oauth.state_ttl.num_seconds(),
            self.oauth.mismatch_policy,
            platforms.join(", "),
            self.uploads.facebook_chunk_size,
            self.uploads.facebook_graph_version,
            self.uploads.tiktok_poll_interval.as_secs(),
            self.uploads.tiktok_max_poll_attempts,
            self.uploads.tiktok_publish_mode,
        )
    }
}
