// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: Re-exports the server configuration and per-platform OAuth registrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

/// Server configuration loaded from environment variables
pub mod environment;
/// Per-platform OAuth client registrations
pub mod oauth;

pub use environment::{OAuthLedgerConfig, PlatformCredentials, ServerConfig};
pub use oauth::{OAuthClientConfig, PlatformEnvNames};
