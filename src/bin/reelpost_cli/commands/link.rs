// ABOUTME: Account linking commands for reelpost-cli
// ABOUTME: Start prints the authorization URL; complete redeems the redirect parameters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use reelpost_server::{
    errors::AppResult,
    models::Platform,
    oauth2_client::{CompleteLinkRequest, StartLinkOptions},
    resources::ServerResources,
};

use crate::helpers::display::{display_link_complete, display_link_start};

/// Issue a state and print the authorization URL
pub async fn start(
    resources: &ServerResources,
    platform: Platform,
    force_consent: bool,
) -> AppResult<()> {
    let options = StartLinkOptions {
        force_consent,
        ..StartLinkOptions::default()
    };
    let response = resources.flow_manager.start_link(platform, options).await?;
    display_link_start(&response);
    Ok(())
}

/// Redeem the redirect parameters and store the account
pub async fn complete(
    resources: &ServerResources,
    platform: Platform,
    code: String,
    state: String,
    verifier: String,
) -> AppResult<()> {
    let request = CompleteLinkRequest {
        code: Some(code),
        state: Some(state),
        code_verifier: Some(verifier),
    };
    let response = resources
        .flow_manager
        .complete_link(platform, &request)
        .await?;
    display_link_complete(&response);
    Ok(())
}
