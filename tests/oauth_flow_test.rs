// ABOUTME: Integration tests for account linking across TikTok, YouTube, and Facebook
// ABOUTME: Start, complete, relink, rejection, and unlink against scripted platform endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::DateTime;
use reelpost_providers::{HttpMethod, ScriptedTransport, TransportResponse};
use reelpost_server::{
    config::ServerConfig,
    database::CredentialStore,
    errors::ErrorCode,
    models::{Platform, StateContext},
    oauth2_client::{code_challenge_for, CompleteLinkRequest, StartLinkOptions},
};
use serde_json::json;
use std::collections::HashMap;
use url::Url;

const YOUTUBE_TOKEN: &str = "oauth2.googleapis.com/token";
const FACEBOOK_TOKEN: &str = "/oauth/access_token";
const TIKTOK_TOKEN: &str = "open.tiktokapis.com/v2/oauth/token/";

fn query_map(auth_url: &str) -> HashMap<String, String> {
    Url::parse(auth_url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn request(code: &str, state: &str, verifier: &str) -> CompleteLinkRequest {
    CompleteLinkRequest {
        code: Some(code.to_owned()),
        state: Some(state.to_owned()),
        code_verifier: Some(verifier.to_owned()),
    }
}

fn script_youtube_link(transport: &ScriptedTransport, channel_id: &str) {
    transport.respond_json(
        HttpMethod::Post,
        YOUTUBE_TOKEN,
        200,
        json!({"access_token": "yt-access", "refresh_token": "yt-refresh", "expires_in": 3599, "scope": "https://www.googleapis.com/auth/youtube.upload"}),
    );
    transport.respond_json(
        HttpMethod::Get,
        "/youtube/v3/channels",
        200,
        json!({"items": [{"id": channel_id, "snippet": {"title": "Trail Notes", "thumbnails": {"default": {"url": "https://yt.test/a.jpg"}}}}]}),
    );
}

#[tokio::test]
async fn test_start_link_builds_pkce_authorization_url() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();

    let started = resources
        .flow_manager
        .start_link(
            Platform::YouTube,
            StartLinkOptions {
                force_consent: true,
                ..StartLinkOptions::default()
            },
        )
        .await
        .unwrap();

    assert!(started.auth_url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    let query = query_map(&started.auth_url);
    assert_eq!(query["client_id"], "youtube-client");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["state"], started.state);
    assert_eq!(query["code_challenge"], code_challenge_for(&started.code_verifier));
    assert_eq!(query["code_challenge_method"], "S256");
    assert_eq!(query["access_type"], "offline");
    assert_eq!(query["prompt"], "consent");
    assert_eq!(
        query["redirect_uri"],
        "http://localhost:8081/api/oauth/youtube/callback"
    );
    assert!(!started.auth_url.contains(&started.code_verifier));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_tiktok_url_uses_client_key_and_comma_scopes() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let started = resources
        .flow_manager
        .start_link(Platform::TikTok, StartLinkOptions::default())
        .await
        .unwrap();
    let query = query_map(&started.auth_url);
    assert_eq!(query["client_key"], "tiktok-client");
    assert_eq!(query["scope"], "user.info.basic,video.upload,video.publish");
    assert!(!query.contains_key("client_id"));
}

#[tokio::test]
async fn test_unconfigured_platform_cannot_start() {
    let (resources, _transport) = common::create_test_resources(ServerConfig::default())
        .await
        .unwrap();
    let err = resources
        .flow_manager
        .start_link(Platform::Facebook, StartLinkOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigurationError);
    assert!(err.message.contains("FACEBOOK_APP_ID"));
}

#[tokio::test]
async fn test_youtube_link_then_relink() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    let context = StateContext {
        user_id: Some("user-7".to_owned()),
        workspace_id: None,
    };

    let started = resources
        .flow_manager
        .start_link(
            Platform::YouTube,
            StartLinkOptions {
                context: context.clone(),
                force_consent: false,
            },
        )
        .await
        .unwrap();
    script_youtube_link(&transport, "UC42");

    let linked = resources
        .flow_manager
        .complete_link(
            Platform::YouTube,
            &request("auth-code", &started.state, &started.code_verifier),
        )
        .await
        .unwrap();
    assert!(linked.is_new);
    assert_eq!(linked.account_id, "UC42");
    assert_eq!(linked.display_name, "Trail Notes");
    assert_eq!(linked.avatar_url.as_deref(), Some("https://yt.test/a.jpg"));
    assert_eq!(linked.context, context);

    let exchange = transport.requests_to(HttpMethod::Post, YOUTUBE_TOKEN).remove(0);
    assert_eq!(exchange.body.field("grant_type"), Some("authorization_code"));
    assert_eq!(exchange.body.field("code"), Some("auth-code"));
    assert_eq!(
        exchange.body.field("code_verifier"),
        Some(started.code_verifier.as_str())
    );

    let stored = resources
        .credentials()
        .get(Platform::YouTube, "UC42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "yt-access");
    assert_eq!(stored.refresh_token.as_deref(), Some("yt-refresh"));

    let again = resources
        .flow_manager
        .start_link(Platform::YouTube, StartLinkOptions::default())
        .await
        .unwrap();
    script_youtube_link(&transport, "UC42");
    let relinked = resources
        .flow_manager
        .complete_link(
            Platform::YouTube,
            &request("code-2", &again.state, &again.code_verifier),
        )
        .await
        .unwrap();
    assert!(!relinked.is_new);
    assert_eq!(resources.credentials().list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_facebook_link_stores_long_lived_page_token() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    let started = resources
        .flow_manager
        .start_link(Platform::Facebook, StartLinkOptions::default())
        .await
        .unwrap();

    transport.respond_json(
        HttpMethod::Post,
        FACEBOOK_TOKEN,
        200,
        json!({"access_token": "short-user-token", "token_type": "bearer", "expires_in": 5183}),
    );
    transport.respond_json(
        HttpMethod::Post,
        FACEBOOK_TOKEN,
        200,
        json!({"access_token": "long-user-token", "token_type": "bearer", "expires_in": 5183944}),
    );
    transport.respond_json(
        HttpMethod::Get,
        "/me/accounts",
        200,
        json!({"data": [{"id": "1020", "name": "Trail Club", "access_token": "page-token"}]}),
    );
    transport.respond_json(
        HttpMethod::Get,
        "/debug_token",
        200,
        json!({"data": {"is_valid": true, "expires_at": 0, "data_access_expires_at": 1_767_225_600}}),
    );

    let linked = resources
        .flow_manager
        .complete_link(
            Platform::Facebook,
            &request("fb-code", &started.state, &started.code_verifier),
        )
        .await
        .unwrap();
    assert_eq!(linked.account_id, "1020");

    let exchanges = transport.requests_to(HttpMethod::Post, FACEBOOK_TOKEN);
    assert_eq!(exchanges.len(), 2);
    assert_eq!(exchanges[1].body.field("grant_type"), Some("fb_exchange_token"));
    assert_eq!(
        exchanges[1].body.field("fb_exchange_token"),
        Some("short-user-token")
    );

    let pages = transport.requests_to(HttpMethod::Get, "/me/accounts").remove(0);
    assert_eq!(pages.bearer.as_deref(), Some("long-user-token"));

    let stored = resources
        .credentials()
        .get(Platform::Facebook, "1020")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "page-token");
    assert_eq!(stored.expires_at, DateTime::from_timestamp(1_767_225_600, 0));

    let inspected = transport.requests_to(HttpMethod::Get, "/debug_token").remove(0);
    assert_eq!(inspected.query_value("input_token").as_deref(), Some("page-token"));
    assert_eq!(
        inspected.query_value("access_token").as_deref(),
        Some("facebook-client|facebook-secret")
    );
}

#[tokio::test]
async fn test_facebook_link_fails_when_page_token_is_invalid() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    let started = resources
        .flow_manager
        .start_link(Platform::Facebook, StartLinkOptions::default())
        .await
        .unwrap();

    transport.respond_json(
        HttpMethod::Post,
        FACEBOOK_TOKEN,
        200,
        json!({"access_token": "short-user-token", "expires_in": 5183}),
    );
    transport.respond_json(
        HttpMethod::Post,
        FACEBOOK_TOKEN,
        200,
        json!({"access_token": "long-user-token", "expires_in": 5183944}),
    );
    transport.respond_json(
        HttpMethod::Get,
        "/me/accounts",
        200,
        json!({"data": [{"id": "1020", "name": "Trail Club", "access_token": "page-token"}]}),
    );
    transport.respond_json(
        HttpMethod::Get,
        "/debug_token",
        200,
        json!({"data": {"is_valid": false}}),
    );

    let err = resources
        .flow_manager
        .complete_link(
            Platform::Facebook,
            &request("fb-code", &started.state, &started.code_verifier),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProviderRejected);
    assert!(resources
        .credentials()
        .get(Platform::Facebook, "1020")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_tiktok_link_uses_open_id_from_token() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    let started = resources
        .flow_manager
        .start_link(Platform::TikTok, StartLinkOptions::default())
        .await
        .unwrap();

    transport.respond_json(
        HttpMethod::Post,
        TIKTOK_TOKEN,
        200,
        json!({"access_token": "act.1", "refresh_token": "rft.1", "expires_in": "86400", "open_id": "open-abc", "scope": "user.info.basic,video.upload"}),
    );
    transport.respond_json(
        HttpMethod::Get,
        "/user/info/",
        200,
        json!({"data": {"user": {"display_name": "runner"}}, "error": {"code": "ok", "message": ""}}),
    );

    let linked = resources
        .flow_manager
        .complete_link(
            Platform::TikTok,
            &request("tt-code", &started.state, &started.code_verifier),
        )
        .await
        .unwrap();
    assert_eq!(linked.account_id, "open-abc");
    assert_eq!(linked.display_name, "runner");

    let exchange = transport.requests_to(HttpMethod::Post, TIKTOK_TOKEN).remove(0);
    assert_eq!(exchange.body.field("client_key"), Some("tiktok-client"));
}

#[tokio::test]
async fn test_missing_parameters_are_listed() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let err = resources
        .flow_manager
        .complete_link(
            Platform::YouTube,
            &CompleteLinkRequest {
                state: Some("s".to_owned()),
                ..CompleteLinkRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingParameters);
    assert!(err.message.ends_with("code, codeVerifier"));
}

#[tokio::test]
async fn test_wrong_verifier_never_reaches_the_platform() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    let started = resources
        .flow_manager
        .start_link(Platform::YouTube, StartLinkOptions::default())
        .await
        .unwrap();

    let err = resources
        .flow_manager
        .complete_link(
            Platform::YouTube,
            &request("code", &started.state, "forged-verifier"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VerifierMismatch);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_code_consumes_the_state() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    let started = resources
        .flow_manager
        .start_link(Platform::YouTube, StartLinkOptions::default())
        .await
        .unwrap();
    transport.respond_json(
        HttpMethod::Post,
        YOUTUBE_TOKEN,
        400,
        json!({"error": "invalid_grant", "error_description": "Bad Request"}),
    );

    let link = request("used-code", &started.state, &started.code_verifier);
    let err = resources
        .flow_manager
        .complete_link(Platform::YouTube, &link)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProviderRejected);
    assert_eq!(
        err.details.as_ref().and_then(|d| d.get("error")),
        Some(&json!("invalid_grant"))
    );

    let err = resources
        .flow_manager
        .complete_link(Platform::YouTube, &link)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(resources.credentials().list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unlink_revokes_refresh_token_and_deletes() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    common::link_fresh_account(resources.credentials(), Platform::YouTube, "UC1")
        .await
        .unwrap();
    transport.respond(
        HttpMethod::Post,
        "oauth2.googleapis.com/revoke",
        TransportResponse::new(200, ""),
    );

    resources
        .flow_manager
        .unlink(Platform::YouTube, "UC1")
        .await
        .unwrap();

    let revoke = transport.requests_to(HttpMethod::Post, "oauth2.googleapis.com/revoke").remove(0);
    assert_eq!(revoke.body.field("token"), Some("refresh"));
    assert!(resources
        .credentials()
        .get(Platform::YouTube, "UC1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unlink_survives_revocation_failure() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    common::link_fresh_account(resources.credentials(), Platform::TikTok, "open-1")
        .await
        .unwrap();
    transport.respond(
        HttpMethod::Post,
        "/v2/oauth/revoke/",
        TransportResponse::new(503, "unavailable"),
    );

    resources
        .flow_manager
        .unlink(Platform::TikTok, "open-1")
        .await
        .unwrap();
    assert!(resources.credentials().list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unlink_facebook_skips_revocation() {
    let (resources, transport) = common::create_test_resources(common::configured_server_config())
        .await
        .unwrap();
    common::link_fresh_account(resources.credentials(), Platform::Facebook, "1020")
        .await
        .unwrap();

    resources
        .flow_manager
        .unlink(Platform::Facebook, "1020")
        .await
        .unwrap();
    assert!(transport.requests().is_empty());

    let err = resources
        .flow_manager
        .unlink(Platform::Facebook, "1020")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}
