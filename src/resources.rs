// ABOUTME: Shared server resources wired once at startup and handed to every route
// ABOUTME: Database, OAuth flow manager, and upload orchestrator over one HTTP transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! Dependency wiring for the server and CLI
//!
//! Everything that talks to a platform shares one [`HttpTransport`]; tests
//! swap in a scripted transport and an in-memory database.

use crate::config::ServerConfig;
use crate::database::{CredentialStore, Database, OAuthStateStore};
use crate::errors::AppResult;
use crate::oauth2_client::{OAuthFlowManager, PlatformClients, StateLedger};
use crate::services::{TokenFreshnessGuard, UploadOrchestrator};
use reelpost_providers::{DriverRegistry, HttpTransport, ReqwestTransport, UploadSettings};
use std::sync::Arc;

/// Long-lived state shared by request handlers
#[derive(Debug)]
pub struct ServerResources {
    /// Effective configuration
    pub config: Arc<ServerConfig>,
    /// Persistence
    pub database: Database,
    /// Linking lifecycle
    pub flow_manager: OAuthFlowManager,
    /// Batch publishing
    pub orchestrator: UploadOrchestrator,
}

impl ServerResources {
    /// Wire resources over an open database and a transport
    #[must_use]
    pub fn new(
        config: ServerConfig,
        database: Database,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::with_drivers(config, database, Arc::clone(&transport), |settings| {
            DriverRegistry::with_defaults(&transport, settings)
        })
    }

    /// Wire resources with a custom driver registry
    #[must_use]
    pub fn with_drivers<F>(
        config: ServerConfig,
        database: Database,
        transport: Arc<dyn HttpTransport>,
        drivers: F,
    ) -> Self
    where
        F: FnOnce(&UploadSettings) -> DriverRegistry,
    {
        let credentials: Arc<dyn CredentialStore> = Arc::new(database.clone());
        let states: Arc<dyn OAuthStateStore> = Arc::new(database.clone());
        let clients = PlatformClients::new(
            config.platforms.clone(),
            config.uploads.facebook_graph_version.clone(),
            transport,
        );

        let ledger = StateLedger::new(states, config.oauth);
        let flow_manager = OAuthFlowManager::new(clients.clone(), ledger, Arc::clone(&credentials));
        let guard = TokenFreshnessGuard::new(clients, Arc::clone(&credentials));
        let orchestrator = UploadOrchestrator::new(credentials, guard, drivers(&config.uploads));

        Self {
            config: Arc::new(config),
            database,
            flow_manager,
            orchestrator,
        }
    }

    /// Open the configured database and wire resources over the shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database_url).await?;
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::shared());
        Ok(Self::new(config, database, transport))
    }

    /// Credential store view of the database
    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialStore {
        &self.database
    }
}
