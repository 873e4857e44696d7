// ABOUTME: Core types and constants for the reelpost multi-platform publishing service
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

#![deny(unsafe_code)]

//! # Reelpost Core
//!
//! Foundation crate providing shared types and constants for the reelpost
//! publishing service. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ProviderError`
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Platforms, linked-account credentials, OAuth state, upload selections

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Core data models (Platform, CredentialRecord, Selection, etc.)
pub mod models;
