// ABOUTME: Route module organization for the reelpost HTTP surface
// ABOUTME: Health, OAuth linking, account removal, and batch upload endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! Route module
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the flow manager or the orchestrator. The
//! surface is unauthenticated; whoever can reach it is trusted.

/// Linked account removal
pub mod accounts;
/// Health check
pub mod health;
/// OAuth linking lifecycle
pub mod oauth;
/// Multipart batch uploads
pub mod uploads;

pub use accounts::AccountRoutes;
pub use health::HealthRoutes;
pub use oauth::OAuthRoutes;
pub use uploads::UploadRoutes;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the complete application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(OAuthRoutes::routes(Arc::clone(&resources)))
        .merge(AccountRoutes::routes(Arc::clone(&resources)))
        .merge(UploadRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
}
