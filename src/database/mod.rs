// ABOUTME: SQLite persistence for linked-account credentials and the OAuth state ledger
// ABOUTME: Pool setup, schema migrations, and the store traits the services depend on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # Database Management
//!
//! A single sqlx `SqlitePool` backs two stores:
//!
//! - [`CredentialStore`]: one row per `(external_account_id, platform)` in
//!   `linked_accounts`
//! - [`OAuthStateStore`]: the `oauth_states` ledger, discriminated by platform
//!
//! Timestamps are stored as unix milliseconds so range comparisons in SQL are
//! plain integer comparisons.

mod credentials;
mod oauth_states;

pub use credentials::CredentialStore;
pub use oauth_states::OAuthStateStore;

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info};

/// Connections kept for file-backed databases
const FILE_POOL_SIZE: u32 = 5;

/// Database manager for credentials and OAuth state
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Filesystem path of a `sqlite:` URL, if it names a file
fn file_path(database_url: &str) -> Option<&str> {
    let rest = database_url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty()).then_some(path)
}

impl Database {
    /// Open the pool and run migrations
    ///
    /// In-memory URLs get a single long-lived connection; every new sqlite
    /// memory connection would otherwise see its own empty database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the URL is invalid, the file cannot be
    /// created, or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let in_memory = is_in_memory(database_url);
        if !in_memory {
            if let Some(parent) = file_path(database_url)
                .map(Path::new)
                .and_then(Path::parent)
                .filter(|parent| !parent.as_os_str().is_empty())
            {
                fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::database(format!(
                        "Cannot create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(FILE_POOL_SIZE)
        };
        let pool = pool_options.connect_with(options).await?;

        let db = Self { pool };
        db.migrate().await?;
        info!(in_memory, "Database ready");
        Ok(db)
    }

    /// Fresh private in-memory database, migrated
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the pool or migrations fail
    pub async fn in_memory() -> AppResult<Self> {
        Self::new("sqlite::memory:").await
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any table or index creation fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_credentials().await?;
        self.migrate_oauth_states().await?;
        debug!("Database migrations applied");
        Ok(())
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::database(format!("Stored timestamp {millis} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths_are_extracted_from_urls() {
        assert_eq!(file_path("sqlite:./data/reelpost.db"), Some("./data/reelpost.db"));
        assert_eq!(file_path("sqlite:///tmp/x.db?mode=rwc"), Some("/tmp/x.db"));
        assert_eq!(file_path("postgres://x"), None);
        assert!(is_in_memory("sqlite::memory:"));
        assert!(!is_in_memory("sqlite:./data/reelpost.db"));
    }

    #[test]
    fn millis_round_trip_at_millisecond_precision() {
        let now = Utc::now();
        let back = from_millis(to_millis(now)).unwrap();
        assert_eq!(back.timestamp_millis(), now.timestamp_millis());
    }
}
