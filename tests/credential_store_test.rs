// ABOUTME: Integration tests for linked account persistence
// ABOUTME: Upsert identity, refresh-token preservation, token updates, listing, and file-backed reopen
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use reelpost_server::{
    database::{CredentialStore, Database},
    errors::ErrorCode,
    models::{Platform, TokenUpdate, UpsertOutcome},
};
use tempfile::TempDir;

#[tokio::test]
async fn test_upsert_reports_insert_then_update() {
    let database = common::create_test_database().await.unwrap();
    let record = common::credential(Platform::TikTok, "open-1", None, Some("rt-1"));

    assert_eq!(database.upsert(&record).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(database.upsert(&record).await.unwrap(), UpsertOutcome::Updated);
    assert_eq!(database.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_id_on_two_platforms_is_two_records() {
    let database = common::create_test_database().await.unwrap();
    database
        .upsert(&common::credential(Platform::TikTok, "shared", None, None))
        .await
        .unwrap();
    let outcome = database
        .upsert(&common::credential(Platform::Facebook, "shared", None, None))
        .await
        .unwrap();

    assert!(outcome.is_new());
    assert_eq!(database.list(None).await.unwrap().len(), 2);
    assert_eq!(
        database.list(Some(Platform::Facebook)).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_relink_without_refresh_token_keeps_stored_one() {
    let database = common::create_test_database().await.unwrap();
    let mut record = common::credential(Platform::YouTube, "UC1", None, Some("original-rt"));
    record.avatar_url = Some("https://cdn.test/a.png".to_owned());
    database.upsert(&record).await.unwrap();

    let mut relink = common::credential(Platform::YouTube, "UC1", None, None);
    relink.access_token = "new-access".to_owned();
    relink.display_name = "Renamed Channel".to_owned();
    database.upsert(&relink).await.unwrap();

    let stored = database.get(Platform::YouTube, "UC1").await.unwrap().unwrap();
    assert_eq!(stored.access_token, "new-access");
    assert_eq!(stored.refresh_token.as_deref(), Some("original-rt"));
    assert_eq!(stored.avatar_url.as_deref(), Some("https://cdn.test/a.png"));
    assert_eq!(stored.display_name, "Renamed Channel");
}

#[tokio::test]
async fn test_update_tokens_replaces_material() {
    let database = common::create_test_database().await.unwrap();
    database
        .upsert(&common::credential(Platform::TikTok, "open-2", None, Some("rt-old")))
        .await
        .unwrap();

    let expires_at = Utc::now() + Duration::hours(1);
    let updated = database
        .update_tokens(
            Platform::TikTok,
            "open-2",
            &TokenUpdate {
                access_token: "fresh".to_owned(),
                refresh_token: Some("rt-new".to_owned()),
                expires_at: Some(expires_at),
                scope: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.access_token, "fresh");
    assert_eq!(updated.refresh_token.as_deref(), Some("rt-new"));
    assert_eq!(
        updated.expires_at.map(|at| at.timestamp_millis()),
        Some(expires_at.timestamp_millis())
    );
}

#[tokio::test]
async fn test_update_tokens_for_unknown_account_is_not_found() {
    let database = common::create_test_database().await.unwrap();
    let err = database
        .update_tokens(
            Platform::Facebook,
            "missing",
            &TokenUpdate {
                access_token: "x".to_owned(),
                refresh_token: None,
                expires_at: None,
                scope: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_delete_removes_only_the_pair() {
    let database = common::create_test_database().await.unwrap();
    database
        .upsert(&common::credential(Platform::TikTok, "a", None, None))
        .await
        .unwrap();
    database
        .upsert(&common::credential(Platform::YouTube, "a", None, None))
        .await
        .unwrap();

    assert!(database.delete(Platform::TikTok, "a").await.unwrap());
    assert!(!database.delete(Platform::TikTok, "a").await.unwrap());
    assert!(database.get(Platform::YouTube, "a").await.unwrap().is_some());
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("nested/reelpost.db").display());

    {
        let database = Database::new(&url).await.unwrap();
        database
            .upsert(&common::credential(Platform::YouTube, "UC9", None, Some("rt")))
            .await
            .unwrap();
    }

    let reopened = Database::new(&url).await.unwrap();
    let stored = reopened.get(Platform::YouTube, "UC9").await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("rt"));
}
