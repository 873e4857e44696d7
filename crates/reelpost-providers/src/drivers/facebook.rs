// ABOUTME: Facebook Pages resumable video upload: start, sequential chunk transfer, finish
// ABOUTME: Offsets advance by the bytes actually sent; any failed chunk abandons the session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # Facebook Chunked Upload
//!
//! The Graph API upload session has three phases posted to
//! `/{page-id}/videos`: `start` declares the size and opens a session,
//! `transfer` sends one byte range at a time, and `finish` publishes the
//! video with its title and description.
//!
//! The transfer loop never trusts the offsets Facebook echoes back. Each
//! iteration sends `min(chunk_size, remaining)` bytes starting at the local
//! offset and then advances by exactly that many bytes, so the loop always
//! terminates after `ceil(size / chunk_size)` transfers.

use super::{
    missing_field, report, ProgressListener, PublishRequest, UploadDriver, UploadReceipt,
    UploadSettings,
};
use crate::constants::endpoints::facebook;
use crate::errors::{ProviderError, ProviderResult};
use crate::models::{Platform, Privacy, UploadMetadata, UploadPhase};
use crate::transport::{HttpTransport, MultipartField, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PROVIDER: &str = "facebook";

/// Title sent in the finish phase
#[must_use]
pub fn compose_title(metadata: &UploadMetadata) -> String {
    metadata
        .title()
        .or_else(|| metadata.caption())
        .unwrap_or_default()
        .to_owned()
}

/// Description sent in the finish phase: description (or caption) followed by hashtags
#[must_use]
pub fn compose_description(metadata: &UploadMetadata) -> String {
    let body = metadata
        .description()
        .or_else(|| metadata.caption())
        .unwrap_or_default();
    match metadata.hashtags() {
        Some(tags) if body.is_empty() => tags,
        Some(tags) => format!("{body}\n\n{tags}"),
        None => body.to_owned(),
    }
}

/// Whether the video is published on the Page; anything but public stays unpublished
#[must_use]
pub const fn published_flag(privacy: Option<Privacy>) -> bool {
    matches!(privacy, None | Some(Privacy::Public))
}

/// Graph API offsets arrive as strings or numbers
fn offset_value(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::String(s) => s.parse().ok(),
        other => other.as_u64(),
    }
}

/// Decode a Graph response; a 4xx carrying an `error` object is a rejection
fn graph_body(response: &TransportResponse) -> ProviderResult<Value> {
    let raw: Option<Value> = serde_json::from_slice(&response.body).ok();
    if !response.is_success() {
        if let Some(error) = raw.as_ref().and_then(|v| v.get("error")) {
            if response.status < 500 {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Graph API error");
                return Err(ProviderError::rejected(PROVIDER, message, Some(error.clone())));
            }
        }
        return Err(ProviderError::HttpStatus {
            provider: PROVIDER.to_owned(),
            status: response.status,
            body: response.text(),
        });
    }
    raw.ok_or_else(|| ProviderError::invalid_response(PROVIDER, "body is not JSON"))
}

/// Driver for Facebook Page chunked uploads
pub struct FacebookDriver {
    transport: Arc<dyn HttpTransport>,
    video_base: String,
    chunk_size: u64,
}

impl fmt::Debug for FacebookDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacebookDriver")
            .field("video_base", &self.video_base)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl FacebookDriver {
    /// Driver over `transport` tuned by `settings`
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, settings: &UploadSettings) -> Self {
        Self {
            transport,
            video_base: format!(
                "{}/{}",
                facebook::GRAPH_VIDEO_HOST,
                settings.facebook_graph_version
            ),
            chunk_size: UploadSettings::clamp_chunk_size(settings.facebook_chunk_size),
        }
    }

    fn videos_url(&self, page_id: &str) -> String {
        format!("{}/{page_id}/videos", self.video_base)
    }

    async fn start(&self, request: &PublishRequest<'_>) -> ProviderResult<(String, Option<String>)> {
        let response = self
            .transport
            .execute(
                TransportRequest::post(PROVIDER, self.videos_url(request.account_id))
                    .bearer(request.access_token)
                    .form([
                        ("upload_phase", "start".to_owned()),
                        ("file_size", request.video.size().to_string()),
                    ]),
            )
            .await?;
        let body = graph_body(&response)?;
        let session_id = body
            .get("upload_session_id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| missing_field(PROVIDER, "upload_session_id"))?;
        let video_id = body.get("video_id").and_then(Value::as_str).map(str::to_owned);
        debug!(
            session_id = %session_id,
            start_offset = offset_value(body.get("start_offset")),
            end_offset = offset_value(body.get("end_offset")),
            "Facebook upload session started"
        );
        Ok((session_id, video_id))
    }

    async fn transfer_chunk(
        &self,
        request: &PublishRequest<'_>,
        session_id: &str,
        start_offset: u64,
        end_offset: u64,
    ) -> ProviderResult<Option<u64>> {
        let slice = request
            .video
            .data
            .slice(start_offset as usize..end_offset as usize);
        let response = self
            .transport
            .execute(
                TransportRequest::post(PROVIDER, self.videos_url(request.account_id))
                    .bearer(request.access_token)
                    .multipart(vec![
                        MultipartField::text("upload_phase", "transfer"),
                        MultipartField::text("upload_session_id", session_id),
                        MultipartField::text("start_offset", start_offset.to_string()),
                        MultipartField::file(
                            "video_file_chunk",
                            request.video.file_name.clone(),
                            request.video.mime_type.clone(),
                            slice,
                        ),
                    ]),
            )
            .await?;
        let body = graph_body(&response)?;
        Ok(offset_value(body.get("start_offset")))
    }

    async fn finish(&self, request: &PublishRequest<'_>, session_id: &str) -> ProviderResult<()> {
        let published = published_flag(request.metadata.privacy);
        let response = self
            .transport
            .execute(
                TransportRequest::post(PROVIDER, self.videos_url(request.account_id))
                    .bearer(request.access_token)
                    .form([
                        ("upload_phase", "finish".to_owned()),
                        ("upload_session_id", session_id.to_owned()),
                        ("title", compose_title(request.metadata)),
                        ("description", compose_description(request.metadata)),
                        ("published", published.to_string()),
                    ]),
            )
            .await?;
        let body = graph_body(&response)?;
        if body.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(ProviderError::rejected(
                PROVIDER,
                "finish phase did not report success",
                Some(body),
            ))
        }
    }
}

#[async_trait]
impl UploadDriver for FacebookDriver {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn publish(
        &self,
        request: PublishRequest<'_>,
        progress: Arc<dyn ProgressListener>,
    ) -> ProviderResult<UploadReceipt> {
        let total = request.video.size();
        report(progress.as_ref(), UploadPhase::Init, 0, total);
        let (session_id, video_id) = self.start(&request).await?;
        info!(
            account_id = request.account_id,
            session_id = %session_id,
            video_size = total,
            chunk_size = self.chunk_size,
            "Facebook upload session opened"
        );

        let mut offset = 0_u64;
        let mut index = 0_usize;
        while offset < total {
            let end = offset + self.chunk_size.min(total - offset);
            match self.transfer_chunk(&request, &session_id, offset, end).await {
                Ok(echo) => {
                    if echo.is_some_and(|next| next != end) {
                        debug!(
                            session_id = %session_id,
                            offset = end,
                            echoed = ?echo,
                            "Facebook echoed a different offset; continuing from bytes sent"
                        );
                    }
                }
                Err(source) => {
                    warn!(
                        session_id = %session_id,
                        chunk_index = index,
                        start_offset = offset,
                        end_offset = end,
                        error = %source,
                        "Facebook chunk failed; abandoning session"
                    );
                    report(progress.as_ref(), UploadPhase::Failed, offset, total);
                    return Err(ProviderError::ChunkFailed {
                        provider: PROVIDER.to_owned(),
                        index,
                        start_offset: offset,
                        end_offset: end,
                        source: Box::new(source),
                    });
                }
            }
            offset = end;
            index += 1;
            report(progress.as_ref(), UploadPhase::Transfer, offset, total);
        }

        report(progress.as_ref(), UploadPhase::Finalize, total, total);
        self.finish(&request, &session_id).await?;
        info!(
            account_id = request.account_id,
            session_id = %session_id,
            chunks = index,
            "Facebook upload finished"
        );
        report(progress.as_ref(), UploadPhase::Complete, total, total);
        Ok(UploadReceipt {
            platform: Platform::Facebook,
            reference: video_id,
            message: "Uploaded to the Facebook Page".to_owned(),
            confirmed: true,
        })
    }
}
