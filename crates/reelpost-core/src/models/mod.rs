// ABOUTME: Core data models shared by the server, providers, and tests
// ABOUTME: Platforms, linked-account credentials, OAuth state records, and upload selections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

/// Linked account credential record
pub mod credential;
/// OAuth state ledger record and redemption context
pub mod oauth_state;
/// Supported publishing platforms
pub mod platform;
/// Upload selections, metadata, progress, and results
pub mod upload;

pub use credential::{CredentialRecord, TokenUpdate, UpsertOutcome};
pub use oauth_state::{MismatchPolicy, OAuthStateRecord, StateContext};
pub use platform::Platform;
pub use upload::{
    Privacy, Selection, SelectionResult, SelectionStatus, UploadEvent, UploadMetadata,
    UploadPhase, UploadProgress,
};
