// ABOUTME: Main library entry point for the reelpost multi-platform video publisher
// ABOUTME: OAuth account linking with PKCE plus sequential uploads to TikTok, YouTube, and Facebook
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

#![deny(unsafe_code)]

//! # Reelpost Server
//!
//! Links accounts on three video platforms and publishes one local video to
//! any number of them in a single action.
//!
//! ## Architecture
//!
//! - **`oauth2_client`**: PKCE authorization, a single-use state ledger, and
//!   the start/complete/unlink lifecycle
//! - **services**: token freshness guarantees and the upload orchestrator
//! - **database**: sqlite persistence for credentials and OAuth state
//! - **routes**: the axum HTTP surface
//! - **`reelpost_providers`**: transport, platform descriptors, and the three
//!   upload drivers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use reelpost_server::config::ServerConfig;
//! use reelpost_server::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let resources = ServerResources::from_config(config).await?;
//!     println!("{}", resources.config.summary());
//!     Ok(())
//! }
//! ```

/// Unified error handling
pub use reelpost_core::errors;

/// Application constants
pub use reelpost_core::constants;

/// Core data models
pub use reelpost_core::models;

/// Environment-driven configuration
pub mod config;

/// Structured logging setup
pub mod logging;

/// `SQLite` persistence
pub mod database;

/// OAuth 2.0 client, state ledger, and linking flows
pub mod oauth2_client;

/// Token freshness and upload orchestration
pub mod services;

/// Dependency wiring
pub mod resources;

/// HTTP routes
pub mod routes;
