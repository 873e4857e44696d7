// ABOUTME: Linked account removal route
// ABOUTME: Revokes at the platform when supported, then deletes the stored credential
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::errors::AppError;
use crate::models::Platform;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::delete,
    Router,
};
use std::sync::Arc;

/// Account routes implementation
pub struct AccountRoutes;

impl AccountRoutes {
    /// Create all account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/accounts/:platform/:account_id",
                delete(Self::handle_unlink),
            )
            .with_state(resources)
    }

    async fn handle_unlink(
        State(resources): State<Arc<ServerResources>>,
        Path((platform, account_id)): Path<(String, String)>,
    ) -> Result<StatusCode, AppError> {
        let platform: Platform = platform.parse()?;
        resources.flow_manager.unlink(platform, &account_id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
