// ABOUTME: OAuth 2.0 client module for linking TikTok, YouTube, and Facebook accounts
// ABOUTME: PKCE client, platform-scoped state ledger, and the linking flow manager
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # OAuth 2.0 Client Module
//!
//! The server acts as an OAuth 2.0 client on behalf of its operator. This
//! module handles:
//! - Authorization URLs with PKCE (`S256`) and per-platform parameters
//! - Code, refresh, long-lived, and revocation grants
//! - A single state ledger shared by all platforms
//! - The start, complete, and unlink lifecycle

/// Core OAuth 2.0 client implementation
pub mod client;
/// OAuth authorization flow management
pub mod flow_manager;
/// Single-use state ledger
pub mod ledger;

pub use client::{
    code_challenge_for, random_token, OAuth2Client, PkceParams, PlatformClients, TokenGrant,
};
pub use flow_manager::{
    CompleteLinkRequest, CompleteLinkResponse, OAuthFlowManager, StartLinkOptions,
    StartLinkResponse,
};
pub use ledger::{IssuedState, StateLedger};
