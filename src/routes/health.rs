// ABOUTME: Health check route reporting service identity and configured platforms
// ABOUTME: Never touches a platform API, so it stays cheap for load balancers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::constants::service_names;
use crate::models::Platform;
use crate::resources::ServerResources;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        let platforms: Map<String, Value> = Platform::ALL
            .into_iter()
            .map(|platform| {
                (
                    platform.slug().to_owned(),
                    Value::Bool(resources.config.platforms.get(platform).is_configured()),
                )
            })
            .collect();

        Json(json!({
            "status": "healthy",
            "service": service_names::REELPOST_SERVER,
            "version": env!("CARGO_PKG_VERSION"),
            "platforms": platforms,
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }
}
