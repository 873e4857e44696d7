// ABOUTME: Linked-account credential persistence keyed by (external account id, platform)
// ABOUTME: Upsert preserves refresh token, avatar, and scope when a relink omits them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::{from_millis, to_millis, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{CredentialRecord, Platform, TokenUpdate, UpsertOutcome};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

/// Storage for linked-account credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert or update the record for its `(external_account_id, platform)` pair
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure
    async fn upsert(&self, record: &CredentialRecord) -> AppResult<UpsertOutcome>;

    /// Fetch one record
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure
    async fn get(
        &self,
        platform: Platform,
        external_account_id: &str,
    ) -> AppResult<Option<CredentialRecord>>;

    /// Replace token material after a refresh and return the updated record
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is not linked, `DatabaseError` on storage failure
    async fn update_tokens(
        &self,
        platform: Platform,
        external_account_id: &str,
        update: &TokenUpdate,
    ) -> AppResult<CredentialRecord>;

    /// Remove a record; `false` when nothing was stored
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure
    async fn delete(&self, platform: Platform, external_account_id: &str) -> AppResult<bool>;

    /// All records, optionally for one platform, oldest link first
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure
    async fn list(&self, platform: Option<Platform>) -> AppResult<Vec<CredentialRecord>>;
}

fn row_to_record(row: &SqliteRow) -> AppResult<CredentialRecord> {
    let platform: String = row.try_get("platform")?;
    let expires_at: Option<i64> = row.try_get("expires_at")?;
    Ok(CredentialRecord {
        external_account_id: row.try_get("external_account_id")?,
        platform: platform.parse()?,
        access_token: row.try_get("access_token")?,
        refresh_token: row.try_get("refresh_token")?,
        expires_at: expires_at.map(from_millis).transpose()?,
        display_name: row.try_get("display_name")?,
        avatar_url: row.try_get("avatar_url")?,
        scope: row.try_get("scope")?,
        created_at: from_millis(row.try_get("created_at")?)?,
        updated_at: from_millis(row.try_get("updated_at")?)?,
    })
}

const SELECT_COLUMNS: &str = "SELECT external_account_id, platform, access_token, refresh_token, \
     expires_at, display_name, avatar_url, scope, created_at, updated_at FROM linked_accounts";

impl Database {
    /// Create `linked_accounts` table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_credentials(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS linked_accounts (
                external_account_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                expires_at INTEGER,
                display_name TEXT NOT NULL,
                avatar_url TEXT,
                scope TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (external_account_id, platform)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_linked_accounts_platform ON linked_accounts(platform)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn upsert(&self, record: &CredentialRecord) -> AppResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            "SELECT 1 FROM linked_accounts WHERE external_account_id = $1 AND platform = $2",
        )
        .bind(&record.external_account_id)
        .bind(record.platform.tag())
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO linked_accounts (
                external_account_id, platform, access_token, refresh_token, expires_at,
                display_name, avatar_url, scope, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (external_account_id, platform)
            DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = COALESCE(excluded.refresh_token, linked_accounts.refresh_token),
                expires_at = excluded.expires_at,
                display_name = excluded.display_name,
                avatar_url = COALESCE(excluded.avatar_url, linked_accounts.avatar_url),
                scope = COALESCE(excluded.scope, linked_accounts.scope),
                updated_at = excluded.updated_at
            ",
        )
        .bind(&record.external_account_id)
        .bind(record.platform.tag())
        .bind(&record.access_token)
        .bind(&record.refresh_token)
        .bind(record.expires_at.map(to_millis))
        .bind(&record.display_name)
        .bind(&record.avatar_url)
        .bind(&record.scope)
        .bind(to_millis(record.created_at))
        .bind(to_millis(record.updated_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let outcome = if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        debug!(
            platform = %record.platform,
            account_id = %record.external_account_id,
            outcome = ?outcome,
            "Credential upserted"
        );
        Ok(outcome)
    }

    async fn get(
        &self,
        platform: Platform,
        external_account_id: &str,
    ) -> AppResult<Option<CredentialRecord>> {
        let row = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE external_account_id = $1 AND platform = $2"
        ))
        .bind(external_account_id)
        .bind(platform.tag())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn update_tokens(
        &self,
        platform: Platform,
        external_account_id: &str,
        update: &TokenUpdate,
    ) -> AppResult<CredentialRecord> {
        let result = sqlx::query(
            r"
            UPDATE linked_accounts SET
                access_token = $1,
                refresh_token = COALESCE($2, refresh_token),
                expires_at = $3,
                scope = COALESCE($4, scope),
                updated_at = $5
            WHERE external_account_id = $6 AND platform = $7
            ",
        )
        .bind(&update.access_token)
        .bind(&update.refresh_token)
        .bind(update.expires_at.map(to_millis))
        .bind(&update.scope)
        .bind(to_millis(Utc::now()))
        .bind(external_account_id)
        .bind(platform.tag())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "No linked {} account {external_account_id}",
                platform.display_name()
            )));
        }

        self.get(platform, external_account_id).await?.ok_or_else(|| {
            AppError::not_found(format!(
                "Linked {} account {external_account_id} disappeared during refresh",
                platform.display_name()
            ))
        })
    }

    async fn delete(&self, platform: Platform, external_account_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM linked_accounts WHERE external_account_id = $1 AND platform = $2",
        )
        .bind(external_account_id)
        .bind(platform.tag())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, platform: Option<Platform>) -> AppResult<Vec<CredentialRecord>> {
        let rows = match platform {
            Some(platform) => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE platform = $1 ORDER BY created_at, external_account_id"
                ))
                .bind(platform.tag())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} ORDER BY created_at, external_account_id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.iter().map(row_to_record).collect()
    }
}
