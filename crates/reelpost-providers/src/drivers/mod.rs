// ABOUTME: Upload driver contract shared by the TikTok, YouTube, and Facebook drivers
// ABOUTME: Video file loading, progress listeners, publish receipts, tuning, and driver registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # Upload Drivers
//!
//! Each driver runs one platform's `init -> transfer -> finalize/poll` state
//! machine for one video and one account. A driver returns `Ok` only when the
//! platform accepted the video; every other outcome is a [`ProviderError`].

/// Facebook Pages resumable chunked upload
pub mod facebook;
/// TikTok Content Posting API upload with status polling
pub mod tiktok;
/// YouTube resumable single-PUT upload
pub mod youtube;

pub use facebook::FacebookDriver;
pub use tiktok::{TikTokDriver, TikTokPublishMode};
pub use youtube::YouTubeDriver;

use crate::constants::endpoints::facebook as facebook_endpoints;
use crate::constants::uploads::{
    FACEBOOK_DEFAULT_CHUNK_SIZE, FACEBOOK_MAX_CHUNK_SIZE, FACEBOOK_MIN_CHUNK_SIZE,
    TIKTOK_MAX_POLL_ATTEMPTS, TIKTOK_POLL_INTERVAL_SECS,
};
use crate::errors::{AppError, AppResult, ProviderError, ProviderResult};
use crate::models::{Platform, UploadMetadata, UploadPhase, UploadProgress};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

/// Receives progress snapshots while a driver runs
pub trait ProgressListener: Send + Sync {
    /// Called on every phase change and byte-progress update
    fn on_progress(&self, progress: UploadProgress);
}

/// Listener that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressListener for NoopProgress {
    fn on_progress(&self, _progress: UploadProgress) {}
}

pub(crate) fn report(
    listener: &dyn ProgressListener,
    phase: UploadPhase,
    bytes_sent: u64,
    total: u64,
) {
    listener.on_progress(UploadProgress::new(phase, bytes_sent, total));
}

/// A video loaded into memory, ready to be published to several accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    /// File name reported to platforms
    pub file_name: String,
    /// MIME type inferred from the extension
    pub mime_type: String,
    /// File contents; cheap to clone per selection
    pub data: Bytes,
}

impl VideoFile {
    /// Wrap in-memory video bytes
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `data` is empty
    pub fn from_bytes(file_name: impl Into<String>, data: impl Into<Bytes>) -> AppResult<Self> {
        let file_name = file_name.into();
        let data = data.into();
        if data.is_empty() {
            return Err(AppError::validation(format!(
                "Video file '{file_name}' is empty"
            )));
        }
        Ok(Self {
            mime_type: Self::mime_for(&file_name).to_owned(),
            file_name,
            data,
        })
    }

    /// Read a video from disk
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the file cannot be read or is empty
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let data = fs::read(path).await.map_err(|e| {
            AppError::validation(format!("Cannot read video file {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "video".to_owned(), |name| name.to_string_lossy().into_owned());
        Self::from_bytes(file_name, data)
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// MIME type for a video file name
    #[must_use]
    pub fn mime_for(file_name: &str) -> &'static str {
        let extension = Path::new(file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("mp4" | "m4v") => "video/mp4",
            Some("mov") => "video/quicktime",
            Some("webm") => "video/webm",
            Some("mkv") => "video/x-matroska",
            Some("avi") => "video/x-msvideo",
            _ => "application/octet-stream",
        }
    }
}

/// Inputs for publishing one video to one account
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    /// Target account (Facebook Page id, TikTok open_id, YouTube channel id)
    pub account_id: &'a str,
    /// Fresh access token for the account
    pub access_token: &'a str,
    /// Video to publish
    pub video: &'a VideoFile,
    /// Per-account form data
    pub metadata: &'a UploadMetadata,
}

/// What a platform reported after accepting a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Platform that accepted the video
    pub platform: Platform,
    /// Platform-assigned id (publish id, video id)
    pub reference: Option<String>,
    /// Human-readable outcome
    pub message: String,
    /// False when success was inferred rather than observed
    pub confirmed: bool,
}

/// One platform's publish state machine
#[async_trait]
pub trait UploadDriver: Send + Sync {
    /// Platform this driver publishes to
    fn platform(&self) -> Platform;

    /// Publish `request.video` to `request.account_id`
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`] for every non-success outcome
    async fn publish(
        &self,
        request: PublishRequest<'_>,
        progress: Arc<dyn ProgressListener>,
    ) -> ProviderResult<UploadReceipt>;
}

/// Tuning knobs for the three drivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    /// Facebook transfer chunk size, already clamped
    pub facebook_chunk_size: u64,
    /// Facebook Graph API version
    pub facebook_graph_version: String,
    /// Delay before each TikTok status poll
    pub tiktok_poll_interval: Duration,
    /// TikTok status polls before soft success
    pub tiktok_max_poll_attempts: u32,
    /// TikTok init endpoint selection
    pub tiktok_publish_mode: TikTokPublishMode,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            facebook_chunk_size: FACEBOOK_DEFAULT_CHUNK_SIZE,
            facebook_graph_version: facebook_endpoints::DEFAULT_GRAPH_VERSION.to_owned(),
            tiktok_poll_interval: Duration::from_secs(TIKTOK_POLL_INTERVAL_SECS),
            tiktok_max_poll_attempts: TIKTOK_MAX_POLL_ATTEMPTS,
            tiktok_publish_mode: TikTokPublishMode::default(),
        }
    }
}

impl UploadSettings {
    /// Clamp a Facebook chunk size into the accepted range
    #[must_use]
    pub fn clamp_chunk_size(bytes: u64) -> u64 {
        bytes.clamp(FACEBOOK_MIN_CHUNK_SIZE, FACEBOOK_MAX_CHUNK_SIZE)
    }

    /// Set the Facebook chunk size, clamped
    #[must_use]
    pub fn with_facebook_chunk_size(mut self, bytes: u64) -> Self {
        self.facebook_chunk_size = Self::clamp_chunk_size(bytes);
        self
    }
}

/// Drivers keyed by platform
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<Platform, Arc<dyn UploadDriver>>,
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut platforms: Vec<_> = self.drivers.keys().map(|p| p.slug()).collect();
        platforms.sort_unstable();
        f.debug_struct("DriverRegistry")
            .field("platforms", &platforms)
            .finish()
    }
}

impl DriverRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the three built-in drivers over `transport`
    #[must_use]
    pub fn with_defaults(transport: &Arc<dyn HttpTransport>, settings: &UploadSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TikTokDriver::new(Arc::clone(transport), settings)));
        registry.register(Arc::new(YouTubeDriver::new(Arc::clone(transport))));
        registry.register(Arc::new(FacebookDriver::new(Arc::clone(transport), settings)));
        registry
    }

    /// Add or replace the driver for its platform
    pub fn register(&mut self, driver: Arc<dyn UploadDriver>) {
        self.drivers.insert(driver.platform(), driver);
    }

    /// Driver for `platform`
    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<Arc<dyn UploadDriver>> {
        self.drivers.get(&platform).cloned()
    }
}

pub(crate) fn missing_field(provider: &str, field: &str) -> ProviderError {
    ProviderError::invalid_response(provider, format!("response is missing `{field}`"))
}
