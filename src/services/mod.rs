// ABOUTME: Domain service layer shared by the HTTP routes and the operator CLI
// ABOUTME: Token freshness guarantees and the sequential multi-account upload orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! Domain service layer
//!
//! Services hold the business rules so the REST surface and the CLI apply
//! the same behavior regardless of the entry point.

/// Refresh-before-use guarantees for stored credentials
pub mod token_freshness;

/// Sequential publishing across many linked accounts
pub mod upload_orchestrator;

pub use token_freshness::TokenFreshnessGuard;
pub use upload_orchestrator::{validate_selections, UploadOrchestrator};
