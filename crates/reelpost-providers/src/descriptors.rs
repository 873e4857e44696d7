// ABOUTME: Per-platform OAuth descriptors supplied as data rather than per-platform code
// ABOUTME: Endpoints, scopes, client-id parameter naming, consent flags, and capability bits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # Platform Descriptors
//!
//! One [`PlatformDescriptor`] describes everything the PKCE flow needs to know
//! about a platform. The flow itself is written once; TikTok's `client_key`
//! parameter, Google's `access_type=offline`, and Facebook's long-lived token
//! exchange are all expressed here as fields and capability bits.

use crate::constants::endpoints::{facebook, tiktok, youtube};
use crate::models::Platform;

bitflags::bitflags! {
    /// Platform behaviors the OAuth flow and unlink path branch on
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct PlatformCapabilities: u8 {
        /// Issues refresh tokens usable with the refresh_token grant
        const REFRESH_TOKEN = 0b0000_0001;
        /// Exposes a token revocation endpoint
        const TOKEN_REVOCATION = 0b0000_0010;
        /// Short-lived user tokens must be exchanged for long-lived ones
        const LONG_LIVED_EXCHANGE = 0b0000_0100;
    }
}

/// OAuth and API configuration for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    /// Platform described
    pub platform: Platform,
    /// Browser authorization endpoint
    pub auth_url: String,
    /// Token endpoint for authorization_code and refresh_token grants
    pub token_url: String,
    /// Token revocation endpoint
    pub revoke_url: Option<String>,
    /// Token introspection endpoint reporting the expiry of an arbitrary token
    pub token_debug_url: Option<String>,
    /// Base URL for authenticated API calls (profile, pages, channels)
    pub api_base: String,
    /// Scopes requested when the caller names none
    pub default_scopes: &'static [&'static str],
    /// Separator joining scopes in the authorization URL
    pub scope_separator: &'static str,
    /// Name of the client identifier parameter
    pub client_id_param: &'static str,
    /// Extra authorization parameters sent on every request
    pub static_auth_params: &'static [(&'static str, &'static str)],
    /// Parameter forcing the consent screen again
    pub force_consent_param: Option<(&'static str, &'static str)>,
    /// Behavior flags
    pub capabilities: PlatformCapabilities,
}

impl PlatformDescriptor {
    /// Descriptor for `platform`; `graph_version` only affects Facebook
    #[must_use]
    pub fn for_platform(platform: Platform, graph_version: &str) -> Self {
        match platform {
            Platform::TikTok => Self::tiktok(),
            Platform::YouTube => Self::youtube(),
            Platform::Facebook => Self::facebook(graph_version),
        }
    }

    /// TikTok Login Kit v2
    #[must_use]
    pub fn tiktok() -> Self {
        Self {
            platform: Platform::TikTok,
            auth_url: tiktok::AUTH_URL.to_owned(),
            token_url: tiktok::TOKEN_URL.to_owned(),
            revoke_url: Some(tiktok::REVOKE_URL.to_owned()),
            token_debug_url: None,
            api_base: tiktok::API_BASE.to_owned(),
            default_scopes: tiktok::DEFAULT_SCOPES,
            scope_separator: ",",
            client_id_param: "client_key",
            static_auth_params: &[],
            force_consent_param: None,
            capabilities: PlatformCapabilities::REFRESH_TOKEN
                | PlatformCapabilities::TOKEN_REVOCATION,
        }
    }

    /// Google OAuth for the YouTube Data API
    #[must_use]
    pub fn youtube() -> Self {
        Self {
            platform: Platform::YouTube,
            auth_url: youtube::AUTH_URL.to_owned(),
            token_url: youtube::TOKEN_URL.to_owned(),
            revoke_url: Some(youtube::REVOKE_URL.to_owned()),
            token_debug_url: None,
            api_base: youtube::API_BASE.to_owned(),
            default_scopes: youtube::DEFAULT_SCOPES,
            scope_separator: " ",
            client_id_param: "client_id",
            static_auth_params: &[("access_type", "offline"), ("include_granted_scopes", "true")],
            force_consent_param: Some(("prompt", "consent")),
            capabilities: PlatformCapabilities::REFRESH_TOKEN
                | PlatformCapabilities::TOKEN_REVOCATION,
        }
    }

    /// Facebook Login for Pages, pinned to a Graph API version
    #[must_use]
    pub fn facebook(graph_version: &str) -> Self {
        Self {
            platform: Platform::Facebook,
            auth_url: format!("{}/{graph_version}/dialog/oauth", facebook::DIALOG_HOST),
            token_url: format!("{}/{graph_version}/oauth/access_token", facebook::GRAPH_HOST),
            revoke_url: None,
            token_debug_url: Some(format!("{}/{graph_version}/debug_token", facebook::GRAPH_HOST)),
            api_base: format!("{}/{graph_version}", facebook::GRAPH_HOST),
            default_scopes: facebook::DEFAULT_SCOPES,
            scope_separator: ",",
            client_id_param: "client_id",
            static_auth_params: &[],
            force_consent_param: Some(("auth_type", "rerequest")),
            capabilities: PlatformCapabilities::LONG_LIVED_EXCHANGE,
        }
    }

    /// Whether the platform has `capability`
    #[must_use]
    pub const fn has(&self, capability: PlatformCapabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Join `scopes` (or the defaults when empty) with the platform's separator
    #[must_use]
    pub fn scope_string(&self, scopes: &[String]) -> String {
        if scopes.is_empty() {
            self.default_scopes.join(self.scope_separator)
        } else {
            scopes.join(self.scope_separator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiktok_uses_client_key_and_commas() {
        let descriptor = PlatformDescriptor::tiktok();
        assert_eq!(descriptor.client_id_param, "client_key");
        assert_eq!(
            descriptor.scope_string(&[]),
            "user.info.basic,video.upload,video.publish"
        );
    }

    #[test]
    fn facebook_urls_follow_graph_version() {
        let descriptor = PlatformDescriptor::for_platform(Platform::Facebook, "v21.0");
        assert_eq!(
            descriptor.token_url,
            "https://graph.facebook.com/v21.0/oauth/access_token"
        );
        assert!(descriptor.has(PlatformCapabilities::LONG_LIVED_EXCHANGE));
        assert!(!descriptor.has(PlatformCapabilities::REFRESH_TOKEN));
        assert_eq!(
            descriptor.token_debug_url.as_deref(),
            Some("https://graph.facebook.com/v21.0/debug_token")
        );
    }

    #[test]
    fn youtube_requests_offline_access() {
        let descriptor = PlatformDescriptor::youtube();
        assert!(descriptor
            .static_auth_params
            .contains(&("access_type", "offline")));
        assert_eq!(descriptor.force_consent_param, Some(("prompt", "consent")));
        assert_eq!(
            descriptor.scope_string(&["a".to_owned(), "b".to_owned()]),
            "a b"
        );
    }
}
