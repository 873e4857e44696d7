// ABOUTME: Linked account commands for reelpost-cli
// ABOUTME: Lists stored credentials and unlinks accounts with best-effort revocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use reelpost_server::{errors::AppResult, models::Platform, resources::ServerResources};
use tracing::info;

use crate::helpers::display::display_accounts;

/// List linked accounts, optionally for one platform
pub async fn list(resources: &ServerResources, platform: Option<Platform>) -> AppResult<()> {
    let accounts = resources.credentials().list(platform).await?;
    display_accounts(&accounts);
    Ok(())
}

/// Revoke and remove one linked account
pub async fn unlink(
    resources: &ServerResources,
    platform: Platform,
    account_id: &str,
) -> AppResult<()> {
    info!(platform = %platform, account_id, "Unlinking account");
    resources.flow_manager.unlink(platform, account_id).await?;
    println!(
        "Unlinked {} account {account_id}",
        platform.display_name()
    );
    Ok(())
}
