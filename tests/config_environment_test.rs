// ABOUTME: Tests for loading server configuration from environment variables
// ABOUTME: Defaults, overrides, malformed values, and cross-field validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use reelpost_server::config::ServerConfig;
use reelpost_server::models::{MismatchPolicy, Platform};
use serial_test::serial;
use std::env;
use std::time::Duration;

const MANAGED_VARS: &[&str] = &[
    "HTTP_PORT",
    "HOST",
    "BASE_URL",
    "DATABASE_URL",
    "MAX_UPLOAD_BYTES",
    "OAUTH_STATE_TTL_SECS",
    "OAUTH_STATE_MISMATCH_POLICY",
    "FACEBOOK_GRAPH_VERSION",
    "FACEBOOK_CHUNK_SIZE_BYTES",
    "TIKTOK_POLL_INTERVAL_SECS",
    "TIKTOK_MAX_POLL_ATTEMPTS",
    "TIKTOK_PUBLISH_MODE",
    "HTTP_CLIENT_TIMEOUT_SECS",
    "HTTP_CLIENT_CONNECT_TIMEOUT_SECS",
    "TIKTOK_CLIENT_KEY",
    "TIKTOK_CLIENT_SECRET",
    "TIKTOK_REDIRECT_URI",
    "TIKTOK_SCOPES",
    "YOUTUBE_CLIENT_ID",
    "YOUTUBE_CLIENT_SECRET",
    "YOUTUBE_REDIRECT_URI",
    "YOUTUBE_SCOPES",
    "FACEBOOK_APP_ID",
    "FACEBOOK_APP_SECRET",
    "FACEBOOK_REDIRECT_URI",
    "FACEBOOK_SCOPES",
];

fn clear_env() {
    for name in MANAGED_VARS {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 8081);
    assert_eq!(config.base_url, "http://localhost:8081");
    assert_eq!(config.oauth.state_ttl.num_seconds(), 600);
    assert_eq!(config.oauth.mismatch_policy, MismatchPolicy::Retain);
    assert_eq!(config.uploads.facebook_chunk_size, 4 * 1024 * 1024);
    assert_eq!(config.uploads.tiktok_max_poll_attempts, 120);
    assert!(config.configured_platforms().is_empty());
    assert_eq!(
        config.platforms.get(Platform::TikTok).redirect_uri,
        "http://localhost:8081/api/oauth/tiktok/callback"
    );
}

#[test]
#[serial]
fn test_overrides_are_applied() {
    clear_env();
    env::set_var("HTTP_PORT", "9090");
    env::set_var("OAUTH_STATE_TTL_SECS", "120");
    env::set_var("OAUTH_STATE_MISMATCH_POLICY", "BURN");
    env::set_var("TIKTOK_POLL_INTERVAL_SECS", "2");
    env::set_var("FACEBOOK_GRAPH_VERSION", "v21.0");
    env::set_var("YOUTUBE_CLIENT_ID", "yt-id");
    env::set_var("YOUTUBE_CLIENT_SECRET", "yt-secret");
    env::set_var("YOUTUBE_REDIRECT_URI", "https://reel.example/cb");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.http_port, 9090);
    assert_eq!(config.base_url, "http://localhost:9090");
    assert_eq!(config.oauth.state_ttl.num_seconds(), 120);
    assert_eq!(config.oauth.mismatch_policy, MismatchPolicy::Burn);
    assert_eq!(config.uploads.tiktok_poll_interval, Duration::from_secs(2));
    assert_eq!(config.uploads.facebook_graph_version, "v21.0");
    assert_eq!(config.configured_platforms(), vec![Platform::YouTube]);
    assert_eq!(
        config.platforms.get(Platform::YouTube).redirect_uri,
        "https://reel.example/cb"
    );
}

#[test]
#[serial]
fn test_half_configured_platform_is_unconfigured() {
    clear_env();
    env::set_var("FACEBOOK_APP_ID", "app-only");
    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert!(!config.platforms.get(Platform::Facebook).is_configured());
    assert!(config.summary().contains("facebook=not-configured"));
}

#[test]
#[serial]
fn test_summary_never_contains_secrets() {
    clear_env();
    env::set_var("TIKTOK_CLIENT_KEY", "tt-key");
    env::set_var("TIKTOK_CLIENT_SECRET", "super-secret-value");
    let config = ServerConfig::from_env().unwrap();
    clear_env();

    let summary = config.summary();
    assert!(summary.contains("tiktok=configured"));
    assert!(!summary.contains("super-secret-value"));
    assert!(!format!("{config:?}").contains("super-secret-value"));
}

#[test]
#[serial]
fn test_chunk_size_is_clamped() {
    clear_env();
    env::set_var("FACEBOOK_CHUNK_SIZE_BYTES", "64");
    let small = ServerConfig::from_env().unwrap();
    env::set_var("FACEBOOK_CHUNK_SIZE_BYTES", "999999999");
    let large = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(small.uploads.facebook_chunk_size, 1024 * 1024);
    assert_eq!(large.uploads.facebook_chunk_size, 8 * 1024 * 1024);
}

#[test]
#[serial]
fn test_malformed_values_are_rejected() {
    clear_env();
    env::set_var("HTTP_PORT", "eighty");
    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("HTTP_PORT"));

    clear_env();
    env::set_var("OAUTH_STATE_MISMATCH_POLICY", "shrug");
    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("OAUTH_STATE_MISMATCH_POLICY"));
    clear_env();
}

#[test]
#[serial]
fn test_validation_rejects_bad_combinations() {
    clear_env();
    env::set_var("OAUTH_STATE_TTL_SECS", "0");
    assert!(ServerConfig::from_env().is_err());

    env::set_var("OAUTH_STATE_TTL_SECS", i64::MAX.to_string());
    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("OAUTH_STATE_TTL_SECS"));

    env::set_var("OAUTH_STATE_TTL_SECS", "86401");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("TIKTOK_MAX_POLL_ATTEMPTS", "0");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("DATABASE_URL", "postgres://localhost/reelpost");
    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("sqlite"));
    clear_env();

    let mut config = ServerConfig::default();
    assert!(config.validate().is_ok());
    config.max_upload_bytes = 0;
    assert!(config.validate().is_err());
}
