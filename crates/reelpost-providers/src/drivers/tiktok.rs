// ABOUTME: TikTok Content Posting API driver: init, single-chunk PUT, publish status polling
// ABOUTME: Exhausting the poll budget while TikTok is still processing counts as soft success
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::{
    missing_field, report, ProgressListener, PublishRequest, UploadDriver, UploadReceipt,
    UploadSettings,
};
use crate::constants::endpoints::tiktok;
use crate::constants::uploads::TIKTOK_MAX_TITLE_CHARS;
use crate::errors::{ProviderError, ProviderResult};
use crate::models::{Platform, Privacy, UploadMetadata, UploadPhase};
use crate::profiles::TikTokApiError;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const PROVIDER: &str = "tiktok";

/// Which init endpoint TikTok uploads go through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TikTokPublishMode {
    /// Upload to the creator's inbox as a draft (the only mode for unaudited apps)
    #[default]
    Inbox,
    /// Post directly to the profile
    Direct,
}

impl TikTokPublishMode {
    /// Init endpoint for this mode
    #[must_use]
    pub const fn init_url(self) -> &'static str {
        match self {
            Self::Inbox => tiktok::INBOX_INIT_URL,
            Self::Direct => tiktok::DIRECT_POST_INIT_URL,
        }
    }
}

impl fmt::Display for TikTokPublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbox => f.write_str("inbox"),
            Self::Direct => f.write_str("direct"),
        }
    }
}

impl FromStr for TikTokPublishMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(Self::Inbox),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown TikTok publish mode: {other}")),
        }
    }
}

/// TikTok `privacy_level` for a requested visibility
#[must_use]
pub const fn privacy_level(privacy: Privacy) -> &'static str {
    match privacy {
        Privacy::Public => "PUBLIC_TO_EVERYONE",
        Privacy::Unlisted => "MUTUAL_FOLLOW_FRIENDS",
        Privacy::Private => "SELF_ONLY",
    }
}

/// Caption sent as the TikTok title: caption (or title) followed by hashtags
#[must_use]
pub fn compose_caption(metadata: &UploadMetadata) -> String {
    let base = metadata.caption_or_title().unwrap_or_default();
    let caption = match metadata.hashtags() {
        Some(tags) if base.is_empty() => tags,
        Some(tags) => format!("{base} {tags}"),
        None => base.to_owned(),
    };
    caption.chars().take(TIKTOK_MAX_TITLE_CHARS).collect()
}

#[derive(Debug, Deserialize)]
struct InitData {
    publish_id: Option<String>,
    upload_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: Option<String>,
    fail_reason: Option<String>,
    uploaded_bytes: Option<u64>,
}

/// Decode a TikTok envelope, turning a non-`ok` error object into a rejection
fn open_envelope(response: &TransportResponse) -> ProviderResult<Value> {
    let raw: Option<Value> = serde_json::from_slice(&response.body).ok();
    if let Some(error_value) = raw.as_ref().and_then(|v| v.get("error")) {
        if let Ok(error) = serde_json::from_value::<TikTokApiError>(error_value.clone()) {
            if !error.is_ok() {
                return Err(ProviderError::rejected(
                    PROVIDER,
                    format!("{}: {}", error.code, error.message),
                    Some(error_value.clone()),
                ));
            }
        }
    }
    if !response.is_success() {
        return Err(ProviderError::HttpStatus {
            provider: PROVIDER.to_owned(),
            status: response.status,
            body: response.text(),
        });
    }
    raw.ok_or_else(|| ProviderError::invalid_response(PROVIDER, "body is not JSON"))
}

fn data_of<T: DeserializeOwned>(envelope: &Value) -> ProviderResult<T> {
    let data = envelope.get("data").cloned().ok_or_else(|| missing_field(PROVIDER, "data"))?;
    serde_json::from_value(data).map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))
}

/// Driver for TikTok's init/PUT/poll publish flow
pub struct TikTokDriver {
    transport: Arc<dyn HttpTransport>,
    mode: TikTokPublishMode,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl fmt::Debug for TikTokDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TikTokDriver")
            .field("mode", &self.mode)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .finish_non_exhaustive()
    }
}

impl TikTokDriver {
    /// Driver over `transport` tuned by `settings`
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, settings: &UploadSettings) -> Self {
        Self {
            transport,
            mode: settings.tiktok_publish_mode,
            poll_interval: settings.tiktok_poll_interval,
            max_poll_attempts: settings.tiktok_max_poll_attempts,
        }
    }

    async fn init(&self, request: &PublishRequest<'_>) -> ProviderResult<(String, String)> {
        let size = request.video.size();
        let privacy = request.metadata.privacy.unwrap_or(Privacy::Private);
        let body = json!({
            "post_info": {
                "title": compose_caption(request.metadata),
                "privacy_level": privacy_level(privacy),
            },
            "source_info": {
                "source": "FILE_UPLOAD",
                "video_size": size,
                "chunk_size": size,
                "total_chunk_count": 1,
            },
        });
        let response = self
            .transport
            .execute(
                TransportRequest::post(PROVIDER, self.mode.init_url())
                    .bearer(request.access_token)
                    .json(body),
            )
            .await?;
        let envelope = open_envelope(&response)?;
        let data: InitData = data_of(&envelope)?;
        let publish_id = data.publish_id.ok_or_else(|| missing_field(PROVIDER, "publish_id"))?;
        let upload_url = data.upload_url.ok_or_else(|| missing_field(PROVIDER, "upload_url"))?;
        Ok((publish_id, upload_url))
    }

    async fn transfer(
        &self,
        upload_url: &str,
        request: &PublishRequest<'_>,
        progress: &Arc<dyn ProgressListener>,
    ) -> ProviderResult<()> {
        let size = request.video.size();
        let listener = Arc::clone(progress);
        let response = self
            .transport
            .execute(
                TransportRequest::put(PROVIDER, upload_url)
                    .header("Content-Range", format!("bytes 0-{}/{size}", size.saturating_sub(1)))
                    .bytes(request.video.data.clone(), request.video.mime_type.clone())
                    .on_progress(Arc::new(move |sent| {
                        report(listener.as_ref(), UploadPhase::Transfer, sent, size);
                    })),
            )
            .await?;
        response.error_for_status(PROVIDER)?;
        Ok(())
    }

    async fn fetch_status(&self, access_token: &str, publish_id: &str) -> ProviderResult<StatusData> {
        let response = self
            .transport
            .execute(
                TransportRequest::post(PROVIDER, tiktok::STATUS_URL)
                    .bearer(access_token)
                    .json(json!({ "publish_id": publish_id })),
            )
            .await?;
        let envelope = open_envelope(&response)?;
        data_of(&envelope)
    }

    async fn poll(
        &self,
        access_token: &str,
        publish_id: &str,
        total: u64,
        progress: &dyn ProgressListener,
    ) -> ProviderResult<UploadReceipt> {
        let mut observed = false;
        let mut last_error = None;
        for attempt in 1..=self.max_poll_attempts {
            sleep(self.poll_interval).await;
            let status = match self.fetch_status(access_token, publish_id).await {
                Ok(status) => status,
                Err(e) if e.is_transient() => {
                    warn!(publish_id, attempt, error = %e, "TikTok status poll failed; retrying");
                    last_error = Some(e);
                    continue;
                }
                Err(e) => {
                    warn!(publish_id, attempt, error = %e, "TikTok status poll refused");
                    report(progress, UploadPhase::Failed, total, total);
                    return Err(e);
                }
            };
            observed = true;
            let state = status.status.as_deref().unwrap_or("UNKNOWN");
            match state {
                "PUBLISH_COMPLETE" | "SEND_TO_USER_INBOX" => {
                    info!(publish_id, attempt, status = state, "TikTok publish complete");
                    report(progress, UploadPhase::Complete, total, total);
                    let message = if state == "SEND_TO_USER_INBOX" {
                        "Sent to the TikTok inbox; finish posting in the app"
                    } else {
                        "Published to TikTok"
                    };
                    return Ok(UploadReceipt {
                        platform: Platform::TikTok,
                        reference: Some(publish_id.to_owned()),
                        message: message.to_owned(),
                        confirmed: true,
                    });
                }
                "FAILED" => {
                    let reason = status.fail_reason.unwrap_or_else(|| "FAILED".to_owned());
                    warn!(publish_id, attempt, reason = %reason, "TikTok publish failed");
                    report(progress, UploadPhase::Failed, total, total);
                    return Err(ProviderError::rejected(
                        PROVIDER,
                        reason.clone(),
                        Some(json!({ "publish_id": publish_id, "fail_reason": reason })),
                    ));
                }
                other => {
                    debug!(
                        publish_id,
                        attempt,
                        status = other,
                        uploaded_bytes = status.uploaded_bytes,
                        "TikTok still processing"
                    );
                }
            }
        }

        // Soft success needs at least one status showing the upload is processing
        if !observed {
            if let Some(error) = last_error {
                warn!(publish_id, error = %error, "TikTok status never reachable");
                report(progress, UploadPhase::Failed, total, total);
                return Err(error);
            }
        }

        info!(
            publish_id,
            attempts = self.max_poll_attempts,
            "TikTok poll budget exhausted while processing; reporting soft success"
        );
        report(progress, UploadPhase::Complete, total, total);
        Ok(UploadReceipt {
            platform: Platform::TikTok,
            reference: Some(publish_id.to_owned()),
            message: "Upload accepted; TikTok is still processing it, check your inbox".to_owned(),
            confirmed: false,
        })
    }
}

#[async_trait]
impl UploadDriver for TikTokDriver {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    async fn publish(
        &self,
        request: PublishRequest<'_>,
        progress: Arc<dyn ProgressListener>,
    ) -> ProviderResult<UploadReceipt> {
        let total = request.video.size();
        report(progress.as_ref(), UploadPhase::Init, 0, total);
        let (publish_id, upload_url) = self.init(&request).await?;
        info!(
            account_id = request.account_id,
            publish_id = %publish_id,
            mode = %self.mode,
            video_size = total,
            "TikTok publish initialized"
        );

        self.transfer(&upload_url, &request, &progress).await?;
        report(progress.as_ref(), UploadPhase::Poll, total, total);
        self.poll(request.access_token, &publish_id, total, progress.as_ref())
            .await
    }
}
