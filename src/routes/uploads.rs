// ABOUTME: Batch upload route accepting one video and a JSON selection list as multipart
// ABOUTME: Returns one result per selection in input order; only validation fails the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::errors::AppError;
use crate::models::{Selection, SelectionResult};
use crate::resources::ServerResources;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use reelpost_providers::VideoFile;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Fallback name when the multipart file part carries none
const DEFAULT_FILE_NAME: &str = "upload.mp4";

/// Batch upload outcome
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// One entry per selection, in input order
    pub results: Vec<SelectionResult>,
    /// Selections the platforms accepted
    pub succeeded: usize,
    /// Selections that failed
    pub failed: usize,
}

fn multipart_error(error: MultipartError) -> AppError {
    AppError::validation(format!("Malformed multipart upload: {error}"))
}

/// Upload routes implementation
pub struct UploadRoutes;

impl UploadRoutes {
    /// Create all upload routes; the body limit comes from `MAX_UPLOAD_BYTES`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        let body_limit = resources.config.max_upload_bytes;
        Router::new()
            .route("/api/uploads", post(Self::handle_upload))
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(resources)
    }

    async fn handle_upload(
        State(resources): State<Arc<ServerResources>>,
        mut multipart: Multipart,
    ) -> Result<Json<UploadResponse>, AppError> {
        let mut video: Option<VideoFile> = None;
        let mut selections: Option<Vec<Selection>> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    let file_name = field
                        .file_name()
                        .filter(|candidate| !candidate.is_empty())
                        .unwrap_or(DEFAULT_FILE_NAME)
                        .to_owned();
                    let data = field.bytes().await.map_err(multipart_error)?;
                    video = Some(VideoFile::from_bytes(file_name, data)?);
                }
                Some("selections") => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    let parsed: Vec<Selection> = serde_json::from_str(&raw).map_err(|e| {
                        AppError::validation(format!("selections is not a valid list: {e}"))
                    })?;
                    selections = Some(parsed);
                }
                other => debug!(field = ?other, "Ignoring unknown multipart field"),
            }
        }

        let video = video.ok_or_else(|| AppError::validation("A video file is required"))?;
        let selections =
            selections.ok_or_else(|| AppError::validation("The selections field is required"))?;

        let results = resources
            .orchestrator
            .upload_to_selections(&video, &selections, None)
            .await?;
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Ok(Json(UploadResponse {
            failed: results.len() - succeeded,
            succeeded,
            results,
        }))
    }
}
