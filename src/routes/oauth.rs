// ABOUTME: OAuth linking routes: start, platform callback relay, and completion
// ABOUTME: Handlers parse the platform path segment and delegate to the flow manager
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::errors::AppError;
use crate::models::{Platform, StateContext};
use crate::oauth2_client::{
    CompleteLinkRequest, CompleteLinkResponse, StartLinkOptions, StartLinkResponse,
};
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Optional body for `POST /api/oauth/:platform/start`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLinkBody {
    /// Caller's user id, returned on completion
    pub user_id: Option<String>,
    /// Caller's workspace id, returned on completion
    pub workspace_id: Option<String>,
    /// Re-prompt for consent
    #[serde(default)]
    pub force_consent: bool,
}

/// Query parameters a platform appends to the redirect URI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code
    pub code: Option<String>,
    /// State token
    pub state: Option<String>,
    /// Platform error code when the user declined
    pub error: Option<String>,
    /// Platform error text
    pub error_description: Option<String>,
}

/// Callback parameters relayed back to the caller, who holds the verifier
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRelay {
    /// Platform slug
    pub platform: String,
    /// Authorization code
    pub code: Option<String>,
    /// State token
    pub state: Option<String>,
    /// Platform error, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// OAuth linking routes implementation
pub struct OAuthRoutes;

impl OAuthRoutes {
    /// Create all OAuth linking routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/oauth/:platform/start", post(Self::handle_start))
            .route("/api/oauth/:platform/callback", get(Self::handle_callback))
            .route("/api/oauth/:platform/complete", post(Self::handle_complete))
            .with_state(resources)
    }

    async fn handle_start(
        State(resources): State<Arc<ServerResources>>,
        Path(platform): Path<String>,
        body: Option<Json<StartLinkBody>>,
    ) -> Result<Json<StartLinkResponse>, AppError> {
        let platform: Platform = platform.parse()?;
        let body = body.map(|Json(body)| body).unwrap_or_default();
        let options = StartLinkOptions {
            context: StateContext {
                user_id: body.user_id,
                workspace_id: body.workspace_id,
            },
            force_consent: body.force_consent,
        };
        let response = resources.flow_manager.start_link(platform, options).await?;
        Ok(Json(response))
    }

    async fn handle_callback(
        Path(platform): Path<String>,
        Query(query): Query<CallbackQuery>,
    ) -> Result<Json<CallbackRelay>, AppError> {
        let platform: Platform = platform.parse()?;
        let error = query.error.map(|code| match query.error_description {
            Some(description) => format!("{code}: {description}"),
            None => code,
        });
        Ok(Json(CallbackRelay {
            platform: platform.slug().to_owned(),
            code: query.code,
            state: query.state,
            error,
        }))
    }

    async fn handle_complete(
        State(resources): State<Arc<ServerResources>>,
        Path(platform): Path<String>,
        body: Option<Json<CompleteLinkRequest>>,
    ) -> Result<Json<CompleteLinkResponse>, AppError> {
        let platform: Platform = platform.parse()?;
        let request = body.map(|Json(body)| body).unwrap_or_default();
        let response = resources
            .flow_manager
            .complete_link(platform, &request)
            .await?;
        Ok(Json(response))
    }
}
