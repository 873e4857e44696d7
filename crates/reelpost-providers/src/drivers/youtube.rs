// ABOUTME: YouTube Data API v3 driver: resumable session request, then one PUT of the whole file
// ABOUTME: A dropped response after the full body was sent is reported as an unconfirmed success
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::{missing_field, report, ProgressListener, PublishRequest, UploadDriver, UploadReceipt};
use crate::constants::endpoints::youtube;
use crate::constants::uploads::{YOUTUBE_DEFAULT_CATEGORY, YOUTUBE_MAX_TITLE_CHARS};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::{Platform, Privacy, UploadMetadata, UploadPhase};
use crate::transport::{HttpTransport, TransportRequest};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

const PROVIDER: &str = "youtube";

/// YouTube `privacyStatus` for a requested visibility
#[must_use]
pub const fn privacy_status(privacy: Privacy) -> &'static str {
    match privacy {
        Privacy::Public => "public",
        Privacy::Unlisted => "unlisted",
        Privacy::Private => "private",
    }
}

/// Title trimmed to YouTube's limit; angle brackets are not allowed in titles
#[must_use]
pub fn compose_title(metadata: &UploadMetadata) -> String {
    metadata
        .title()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(YOUTUBE_MAX_TITLE_CHARS)
        .collect()
}

/// Video resource sent when opening the resumable session
#[must_use]
pub fn video_resource(metadata: &UploadMetadata) -> Value {
    let description = metadata
        .description()
        .or_else(|| metadata.caption())
        .unwrap_or_default();
    let tags: Vec<&str> = metadata
        .tags
        .iter()
        .map(|tag| tag.trim().trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .collect();
    json!({
        "snippet": {
            "title": compose_title(metadata),
            "description": description,
            "tags": tags,
            "categoryId": metadata.category_id.as_deref().unwrap_or(YOUTUBE_DEFAULT_CATEGORY),
        },
        "status": {
            "privacyStatus": privacy_status(metadata.privacy.unwrap_or(Privacy::Private)),
            "selfDeclaredMadeForKids": false,
        },
    })
}

/// Driver for YouTube resumable uploads
pub struct YouTubeDriver {
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for YouTubeDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeDriver").finish_non_exhaustive()
    }
}

impl YouTubeDriver {
    /// Driver over `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    async fn open_session(&self, request: &PublishRequest<'_>) -> ProviderResult<String> {
        let response = self
            .transport
            .execute(
                TransportRequest::post(PROVIDER, youtube::UPLOAD_URL)
                    .query([("uploadType", "resumable"), ("part", "snippet,status")])
                    .bearer(request.access_token)
                    .header("X-Upload-Content-Length", request.video.size().to_string())
                    .header("X-Upload-Content-Type", request.video.mime_type.clone())
                    .json(video_resource(request.metadata)),
            )
            .await?
            .error_for_status(PROVIDER)?;
        response
            .header("location")
            .map(str::to_owned)
            .ok_or_else(|| missing_field(PROVIDER, "Location header"))
    }
}

#[async_trait]
impl UploadDriver for YouTubeDriver {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn publish(
        &self,
        request: PublishRequest<'_>,
        progress: Arc<dyn ProgressListener>,
    ) -> ProviderResult<UploadReceipt> {
        let total = request.video.size();
        report(progress.as_ref(), UploadPhase::Init, 0, total);
        let session_url = self.open_session(&request).await?;
        info!(
            account_id = request.account_id,
            video_size = total,
            "YouTube resumable session opened"
        );

        let listener = Arc::clone(&progress);
        let put = TransportRequest::put(PROVIDER, session_url)
            .bytes(request.video.data.clone(), request.video.mime_type.clone())
            .on_progress(Arc::new(move |sent| {
                report(listener.as_ref(), UploadPhase::Transfer, sent, total);
            }));

        match self.transport.execute(put).await {
            Ok(response) => {
                let response = response.error_for_status(PROVIDER).inspect_err(|_| {
                    report(progress.as_ref(), UploadPhase::Failed, 0, total);
                })?;
                let video_id = response
                    .json::<Value>(PROVIDER)
                    .ok()
                    .and_then(|body| body.get("id").and_then(Value::as_str).map(str::to_owned));
                info!(account_id = request.account_id, video_id = ?video_id, "YouTube upload complete");
                report(progress.as_ref(), UploadPhase::Complete, total, total);
                Ok(UploadReceipt {
                    platform: Platform::YouTube,
                    reference: video_id,
                    message: "Uploaded to YouTube".to_owned(),
                    confirmed: true,
                })
            }
            Err(ProviderError::Network {
                bytes_sent: Some(sent),
                message,
                ..
            }) if sent >= total => {
                warn!(
                    account_id = request.account_id,
                    bytes_sent = sent,
                    error = %message,
                    "YouTube response lost after the full body was sent; treating as complete"
                );
                report(progress.as_ref(), UploadPhase::Complete, total, total);
                Ok(UploadReceipt {
                    platform: Platform::YouTube,
                    reference: None,
                    message: "Uploaded to YouTube (response was not received)".to_owned(),
                    confirmed: false,
                })
            }
            Err(error) => {
                report(progress.as_ref(), UploadPhase::Failed, 0, total);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed_to_limit() {
        let metadata = UploadMetadata {
            title: Some(format!("<b>{}", "t".repeat(150))),
            ..UploadMetadata::default()
        };
        let title = compose_title(&metadata);
        assert_eq!(title.chars().count(), YOUTUBE_MAX_TITLE_CHARS);
        assert!(!title.contains('<'));
    }

    #[test]
    fn resource_defaults_category_and_privacy() {
        let metadata = UploadMetadata {
            title: Some("Clip".into()),
            caption: Some("fallback description".into()),
            tags: vec!["#one".into(), "two".into()],
            ..UploadMetadata::default()
        };
        let resource = video_resource(&metadata);
        assert_eq!(resource["snippet"]["categoryId"], "22");
        assert_eq!(resource["snippet"]["description"], "fallback description");
        assert_eq!(resource["snippet"]["tags"], json!(["one", "two"]));
        assert_eq!(resource["status"]["privacyStatus"], "private");
    }
}
