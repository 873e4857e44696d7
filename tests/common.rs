// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory databases, scripted platforms, credential fixtures, and wired resources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `reelpost_server`
//!
//! Each integration test binary pulls this in with `mod common;` and uses
//! the subset it needs.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use reelpost_providers::{
    DriverRegistry, HttpMethod, HttpTransport, ScriptedTransport, TransportResponse, UploadSettings,
    VideoFile,
};
use reelpost_server::{
    config::ServerConfig,
    database::{CredentialStore, Database},
    models::{CredentialRecord, Platform},
    resources::ServerResources,
};
use serde_json::json;
use std::env;
use std::sync::{Arc, Once};
use std::time::Duration as StdDuration;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // TEST_LOG controls the level; quiet by default
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::in_memory().await?)
}

/// Server configuration with client credentials for every platform
pub fn configured_server_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.database_url = "sqlite::memory:".to_owned();
    config.uploads = UploadSettings {
        tiktok_poll_interval: StdDuration::ZERO,
        ..UploadSettings::default()
    };
    for platform in Platform::ALL {
        let registration = config.platforms.get_mut(platform);
        registration.client_id = Some(format!("{}-client", platform.slug()));
        registration.client_secret = Some(format!("{}-secret", platform.slug()));
    }
    config
}

/// Resources over an in-memory database and a scripted transport
pub async fn create_test_resources(
    config: ServerConfig,
) -> Result<(Arc<ServerResources>, Arc<ScriptedTransport>)> {
    let database = create_test_database().await?;
    let scripted = Arc::new(ScriptedTransport::new());
    let transport: Arc<dyn HttpTransport> = scripted.clone();
    let resources = ServerResources::new(config, database, transport);
    Ok((Arc::new(resources), scripted))
}

/// Resources with a caller-built driver registry
pub async fn create_test_resources_with_drivers<F>(
    config: ServerConfig,
    drivers: F,
) -> Result<(Arc<ServerResources>, Arc<ScriptedTransport>)>
where
    F: FnOnce(&UploadSettings) -> DriverRegistry,
{
    let database = create_test_database().await?;
    let scripted = Arc::new(ScriptedTransport::new());
    let transport: Arc<dyn HttpTransport> = scripted.clone();
    let resources = ServerResources::with_drivers(config, database, transport, drivers);
    Ok((Arc::new(resources), scripted))
}

/// Credential fixture expiring at `expires_at`
pub fn credential(
    platform: Platform,
    account_id: &str,
    expires_at: Option<DateTime<Utc>>,
    refresh_token: Option<&str>,
) -> CredentialRecord {
    let now = Utc::now();
    CredentialRecord {
        external_account_id: account_id.to_owned(),
        platform,
        access_token: format!("{account_id}-access"),
        refresh_token: refresh_token.map(str::to_owned),
        expires_at,
        display_name: format!("{} {account_id}", platform.display_name()),
        avatar_url: None,
        scope: None,
        created_at: now,
        updated_at: now,
    }
}

/// Store a credential that stays fresh for a day
pub async fn link_fresh_account(
    store: &dyn CredentialStore,
    platform: Platform,
    account_id: &str,
) -> Result<CredentialRecord> {
    let record = credential(
        platform,
        account_id,
        Some(Utc::now() + Duration::days(1)),
        Some("refresh"),
    );
    store.upsert(&record).await?;
    Ok(record)
}

/// Small in-memory video
pub fn sample_video(bytes: usize) -> VideoFile {
    VideoFile::from_bytes("clip.mp4", vec![7_u8; bytes]).unwrap()
}

/// Script a successful TikTok init, PUT, and immediate completion
pub fn script_tiktok_success(transport: &ScriptedTransport, publish_id: &str) {
    transport.respond_json(
        HttpMethod::Post,
        "/inbox/video/init/",
        200,
        json!({
            "data": {"publish_id": publish_id, "upload_url": "https://upload.tiktok.test/video"},
            "error": {"code": "ok", "message": ""}
        }),
    );
    transport.respond_json(HttpMethod::Put, "upload.tiktok.test", 201, json!({}));
    transport.respond_json(
        HttpMethod::Post,
        "/publish/status/fetch/",
        200,
        json!({
            "data": {"status": "SEND_TO_USER_INBOX"},
            "error": {"code": "ok", "message": ""}
        }),
    );
}

/// Script a successful YouTube session and upload
pub fn script_youtube_success(transport: &ScriptedTransport, video_id: &str) {
    transport.respond(
        HttpMethod::Post,
        "/upload/youtube/v3/videos",
        TransportResponse::new(200, "")
            .with_header("Location", "https://upload.youtube.test/session/1"),
    );
    transport.respond_json(
        HttpMethod::Put,
        "upload.youtube.test/session/1",
        200,
        json!({"id": video_id}),
    );
}
