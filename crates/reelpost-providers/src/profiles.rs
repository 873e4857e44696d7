// ABOUTME: Resolves the linked account identity after a successful code exchange
// ABOUTME: TikTok user info, the YouTube channel, or the first managed Facebook Page
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::descriptors::PlatformDescriptor;
use crate::errors::{ProviderError, ProviderResult};
use crate::models::Platform;
use crate::transport::{HttpTransport, TransportRequest};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Account identity and display metadata for a freshly linked account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedIdentity {
    /// Platform-side account id
    pub external_account_id: String,
    /// Display name
    pub display_name: String,
    /// Avatar URL
    pub avatar_url: Option<String>,
    /// Token that replaces the user token for this account (Facebook Page token)
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TikTokEnvelope {
    #[serde(default)]
    data: Option<TikTokUserData>,
    #[serde(default)]
    error: Option<TikTokApiError>,
}

#[derive(Debug, Deserialize)]
struct TikTokUserData {
    user: TikTokUser,
}

#[derive(Debug, Deserialize)]
struct TikTokUser {
    open_id: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

/// TikTok's `error` object, present on every Open API response
#[derive(Debug, Deserialize)]
pub(crate) struct TikTokApiError {
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) message: String,
}

impl TikTokApiError {
    pub(crate) fn is_ok(&self) -> bool {
        self.code == "ok"
    }
}

#[derive(Debug, Deserialize)]
struct YouTubeChannels {
    #[serde(default)]
    items: Vec<YouTubeChannel>,
}

#[derive(Debug, Deserialize)]
struct YouTubeChannel {
    id: String,
    snippet: YouTubeSnippet,
}

#[derive(Debug, Deserialize)]
struct YouTubeSnippet {
    title: String,
    #[serde(default)]
    thumbnails: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FacebookPages {
    #[serde(default)]
    data: Vec<FacebookPage>,
}

#[derive(Debug, Deserialize)]
struct FacebookPage {
    id: String,
    name: String,
    access_token: String,
    #[serde(default)]
    picture: Option<Value>,
}

/// Look up the identity behind `access_token`
///
/// `token_account_id` is the account id some token endpoints return directly
/// (TikTok's `open_id`) and is used when the profile omits it.
///
/// # Errors
///
/// Returns `Rejected` when the platform reports an error or the user has no
/// channel/page to link, and transport errors otherwise
pub async fn resolve_identity(
    transport: &dyn HttpTransport,
    descriptor: &PlatformDescriptor,
    access_token: &str,
    token_account_id: Option<&str>,
) -> ProviderResult<LinkedIdentity> {
    let identity = match descriptor.platform {
        Platform::TikTok => tiktok_identity(transport, descriptor, access_token, token_account_id).await?,
        Platform::YouTube => youtube_identity(transport, descriptor, access_token).await?,
        Platform::Facebook => facebook_identity(transport, descriptor, access_token).await?,
    };
    info!(
        platform = %descriptor.platform,
        account_id = %identity.external_account_id,
        "Resolved linked account identity"
    );
    Ok(identity)
}

async fn tiktok_identity(
    transport: &dyn HttpTransport,
    descriptor: &PlatformDescriptor,
    access_token: &str,
    token_account_id: Option<&str>,
) -> ProviderResult<LinkedIdentity> {
    let provider = Platform::TikTok.slug();
    let request = TransportRequest::get(provider, format!("{}/user/info/", descriptor.api_base))
        .query([("fields", "open_id,union_id,avatar_url,display_name")])
        .bearer(access_token);
    let response = transport.execute(request).await?.error_for_status(provider)?;
    let raw: Value = response.json(provider)?;
    let envelope: TikTokEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| ProviderError::invalid_response(provider, e.to_string()))?;

    if let Some(error) = envelope.error.as_ref().filter(|e| !e.is_ok()) {
        return Err(ProviderError::rejected(
            provider,
            format!("{}: {}", error.code, error.message),
            raw.get("error").cloned(),
        ));
    }

    let user = envelope.data.map(|data| data.user);
    let open_id = user
        .as_ref()
        .and_then(|u| u.open_id.clone())
        .or_else(|| token_account_id.map(str::to_owned))
        .ok_or_else(|| ProviderError::invalid_response(provider, "user info carried no open_id"))?;

    Ok(LinkedIdentity {
        external_account_id: open_id,
        display_name: user
            .as_ref()
            .and_then(|u| u.display_name.clone())
            .unwrap_or_else(|| "TikTok user".to_owned()),
        avatar_url: user.and_then(|u| u.avatar_url),
        access_token: None,
    })
}

async fn youtube_identity(
    transport: &dyn HttpTransport,
    descriptor: &PlatformDescriptor,
    access_token: &str,
) -> ProviderResult<LinkedIdentity> {
    let provider = Platform::YouTube.slug();
    let request = TransportRequest::get(provider, format!("{}/channels", descriptor.api_base))
        .query([("part", "snippet"), ("mine", "true")])
        .bearer(access_token);
    let response = transport.execute(request).await?.error_for_status(provider)?;
    let channels: YouTubeChannels = response.json(provider)?;

    let channel = channels.items.into_iter().next().ok_or_else(|| {
        ProviderError::rejected(provider, "the Google account has no YouTube channel", None)
    })?;
    let avatar_url = channel
        .snippet
        .thumbnails
        .as_ref()
        .and_then(|thumbs| thumbs.pointer("/default/url"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(LinkedIdentity {
        external_account_id: channel.id,
        display_name: channel.snippet.title,
        avatar_url,
        access_token: None,
    })
}

async fn facebook_identity(
    transport: &dyn HttpTransport,
    descriptor: &PlatformDescriptor,
    access_token: &str,
) -> ProviderResult<LinkedIdentity> {
    let provider = Platform::Facebook.slug();
    let request = TransportRequest::get(provider, format!("{}/me/accounts", descriptor.api_base))
        .query([("fields", "id,name,access_token,picture{url}")])
        .bearer(access_token);
    let response = transport.execute(request).await?.error_for_status(provider)?;
    let pages: FacebookPages = response.json(provider)?;
    let page_count = pages.data.len();

    let page = pages.data.into_iter().next().ok_or_else(|| {
        ProviderError::rejected(provider, "the user manages no Facebook Page", None)
    })?;
    debug!(page_count, page_id = %page.id, "Linking first managed Facebook Page");
    let avatar_url = page
        .picture
        .as_ref()
        .and_then(|picture| picture.pointer("/data/url"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(LinkedIdentity {
        external_account_id: page.id,
        display_name: page.name,
        avatar_url,
        access_token: Some(page.access_token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpMethod, ScriptedTransport};
    use serde_json::json;

    #[tokio::test]
    async fn facebook_links_first_page_with_page_token() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            HttpMethod::Get,
            "/me/accounts",
            200,
            json!({"data": [
                {"id": "111", "name": "First Page", "access_token": "page-token-1",
                 "picture": {"data": {"url": "https://cdn.test/p.png"}}},
                {"id": "222", "name": "Second Page", "access_token": "page-token-2"}
            ]}),
        );
        let identity = resolve_identity(
            &transport,
            &PlatformDescriptor::facebook("v19.0"),
            "user-token",
            None,
        )
        .await
        .unwrap();
        assert_eq!(identity.external_account_id, "111");
        assert_eq!(identity.access_token.as_deref(), Some("page-token-1"));
        assert_eq!(identity.avatar_url.as_deref(), Some("https://cdn.test/p.png"));
    }

    #[tokio::test]
    async fn facebook_without_pages_is_rejected() {
        let transport = ScriptedTransport::new();
        transport.respond_json(HttpMethod::Get, "/me/accounts", 200, json!({"data": []}));
        let err = resolve_identity(
            &transport,
            &PlatformDescriptor::facebook("v19.0"),
            "user-token",
            None,
        )
        .await
        .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn tiktok_falls_back_to_token_open_id() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            HttpMethod::Get,
            "/user/info/",
            200,
            json!({"data": {"user": {"display_name": "creator"}}, "error": {"code": "ok", "message": ""}}),
        );
        let identity = resolve_identity(
            &transport,
            &PlatformDescriptor::tiktok(),
            "token",
            Some("open-123"),
        )
        .await
        .unwrap();
        assert_eq!(identity.external_account_id, "open-123");
        assert_eq!(identity.display_name, "creator");
    }

    #[tokio::test]
    async fn youtube_without_channel_is_rejected() {
        let transport = ScriptedTransport::new();
        transport.respond_json(HttpMethod::Get, "/channels", 200, json!({"items": []}));
        let err = resolve_identity(&transport, &PlatformDescriptor::youtube(), "token", None)
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }
}
