// ABOUTME: OAuth state ledger persistence shared by every platform's linking flow
// ABOUTME: Redemption is a compare-and-set on the used flag so a state is consumed at most once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::{from_millis, to_millis, Database};
use crate::errors::AppResult;
use crate::models::{OAuthStateRecord, Platform, StateContext};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Storage for in-flight OAuth linking flows
#[async_trait]
pub trait OAuthStateStore: Send + Sync {
    /// Persist a freshly issued state
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure, including a duplicate state
    async fn insert(&self, record: &OAuthStateRecord) -> AppResult<()>;

    /// Unused record for `(state, platform)` created strictly after `not_before`
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure
    async fn find_active(
        &self,
        state: &str,
        platform: Platform,
        not_before: DateTime<Utc>,
    ) -> AppResult<Option<OAuthStateRecord>>;

    /// Flip `used` from false to true; `false` when another caller won or the record expired
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure
    async fn mark_used(
        &self,
        state: &str,
        platform: Platform,
        not_before: DateTime<Utc>,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Delete every record created at or before `cutoff`, used or not
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

fn row_to_state(row: &SqliteRow) -> AppResult<OAuthStateRecord> {
    let platform: String = row.try_get("platform")?;
    let used: i64 = row.try_get("used")?;
    let used_at: Option<i64> = row.try_get("used_at")?;
    Ok(OAuthStateRecord {
        state: row.try_get("state")?,
        platform: platform.parse()?,
        code_verifier: row.try_get("code_verifier")?,
        code_challenge: row.try_get("code_challenge")?,
        context: StateContext {
            user_id: row.try_get("user_id")?,
            workspace_id: row.try_get("workspace_id")?,
        },
        created_at: from_millis(row.try_get("created_at")?)?,
        used: used != 0,
        used_at: used_at.map(from_millis).transpose()?,
    })
}

impl Database {
    /// Create `oauth_states` table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails
    pub(super) async fn migrate_oauth_states(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_states (
                state TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                code_verifier TEXT NOT NULL,
                code_challenge TEXT NOT NULL,
                user_id TEXT,
                workspace_id TEXT,
                created_at INTEGER NOT NULL,
                used INTEGER NOT NULL DEFAULT 0,
                used_at INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_oauth_states_created_at ON oauth_states(created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl OAuthStateStore for Database {
    async fn insert(&self, record: &OAuthStateRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO oauth_states (
                state, platform, code_verifier, code_challenge, user_id, workspace_id,
                created_at, used, used_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&record.state)
        .bind(record.platform.tag())
        .bind(&record.code_verifier)
        .bind(&record.code_challenge)
        .bind(&record.context.user_id)
        .bind(&record.context.workspace_id)
        .bind(to_millis(record.created_at))
        .bind(i64::from(record.used))
        .bind(record.used_at.map(to_millis))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active(
        &self,
        state: &str,
        platform: Platform,
        not_before: DateTime<Utc>,
    ) -> AppResult<Option<OAuthStateRecord>> {
        let row = sqlx::query(
            r"
            SELECT state, platform, code_verifier, code_challenge, user_id, workspace_id,
                   created_at, used, used_at
            FROM oauth_states
            WHERE state = $1 AND platform = $2 AND used = 0 AND created_at > $3
            ",
        )
        .bind(state)
        .bind(platform.tag())
        .bind(to_millis(not_before))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_state).transpose()
    }

    async fn mark_used(
        &self,
        state: &str,
        platform: Platform,
        not_before: DateTime<Utc>,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE oauth_states SET used = 1, used_at = $1
            WHERE state = $2 AND platform = $3 AND used = 0 AND created_at > $4
            ",
        )
        .bind(to_millis(used_at))
        .bind(state)
        .bind(platform.tag())
        .bind(to_millis(not_before))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE created_at <= $1")
            .bind(to_millis(cutoff))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
