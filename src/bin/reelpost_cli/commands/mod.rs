// ABOUTME: Command modules for reelpost-cli
// ABOUTME: Account listing and unlinking, link start/complete, and batch upload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

pub mod accounts;
pub mod link;
pub mod upload;
