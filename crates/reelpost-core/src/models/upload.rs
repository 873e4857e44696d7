// ABOUTME: Upload selection inputs, per-account metadata, and per-selection results
// ABOUTME: Progress and event types streamed while a batch is orchestrated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use super::Platform;
use serde::{Deserialize, Serialize};

/// Visibility requested for a published video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    /// Visible to everyone
    Public,
    /// Reachable by link or by followers/friends only, per platform
    Unlisted,
    /// Visible to the account owner only
    #[default]
    Private,
}

/// Per-account form data supplied with a selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadMetadata {
    /// Video title (required for YouTube)
    pub title: Option<String>,
    /// Caption text (TikTok/Facebook accept caption or title)
    pub caption: Option<String>,
    /// Long description
    pub description: Option<String>,
    /// Tags, rendered as hashtags where the platform has no tag field
    pub tags: Vec<String>,
    /// Requested visibility; the platform default applies when absent
    pub privacy: Option<Privacy>,
    /// YouTube category id
    pub category_id: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl UploadMetadata {
    /// Trimmed, non-empty title
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_ref())
    }

    /// Trimmed, non-empty caption
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        non_empty(self.caption.as_ref())
    }

    /// Trimmed, non-empty description
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_ref())
    }

    /// Caption if present, otherwise the title
    #[must_use]
    pub fn caption_or_title(&self) -> Option<&str> {
        self.caption().or_else(|| self.title())
    }

    /// Tags rendered as a space-separated hashtag line
    #[must_use]
    pub fn hashtags(&self) -> Option<String> {
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|tag| tag.trim().trim_start_matches('#').replace(' ', ""))
            .filter(|tag| !tag.is_empty())
            .map(|tag| format!("#{tag}"))
            .collect();
        if tags.is_empty() {
            None
        } else {
            Some(tags.join(" "))
        }
    }

    /// Check that the fields `platform` requires are present
    ///
    /// # Errors
    ///
    /// Returns the name of the missing field
    pub fn validate_for(&self, platform: Platform) -> Result<(), &'static str> {
        match platform {
            Platform::YouTube if self.title().is_none() => Err("title"),
            Platform::TikTok | Platform::Facebook if self.caption_or_title().is_none() => {
                Err("caption or title")
            }
            _ => Ok(()),
        }
    }
}

/// One target of a batch upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Target platform
    pub platform: Platform,
    /// Target account's external id
    pub account_id: String,
    /// Per-account form data
    #[serde(default)]
    pub metadata: UploadMetadata,
}

/// Outcome of one selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStatus {
    /// The platform accepted the video
    Success,
    /// The selection failed; see the message
    Error,
}

/// Result reported for each selection, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    /// Target platform
    pub platform: Platform,
    /// Target account's external id
    pub account_id: String,
    /// Success or error
    pub status: SelectionStatus,
    /// Human-readable outcome
    pub message: String,
    /// Platform-assigned id (publish id, video id) when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Error code name for failed selections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl SelectionResult {
    /// Successful selection
    #[must_use]
    pub fn success(
        selection: &Selection,
        message: impl Into<String>,
        reference: Option<String>,
    ) -> Self {
        Self {
            platform: selection.platform,
            account_id: selection.account_id.clone(),
            status: SelectionStatus::Success,
            message: message.into(),
            reference,
            error_code: None,
        }
    }

    /// Failed selection
    #[must_use]
    pub fn error(
        selection: &Selection,
        message: impl Into<String>,
        error_code: Option<String>,
    ) -> Self {
        Self {
            platform: selection.platform,
            account_id: selection.account_id.clone(),
            status: SelectionStatus::Error,
            message: message.into(),
            reference: None,
            error_code,
        }
    }

    /// Whether the selection succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == SelectionStatus::Success
    }
}

/// Driver state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    /// Session or publish initialization
    Init,
    /// Bytes on the wire
    Transfer,
    /// Session finalization
    Finalize,
    /// Waiting on asynchronous publish status
    Poll,
    /// Terminal success
    Complete,
    /// Terminal failure
    Failed,
}

/// Progress snapshot emitted by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    /// Current phase
    pub phase: UploadPhase,
    /// Bytes confirmed sent so far
    pub bytes_sent: u64,
    /// Total video size
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Build a progress snapshot
    #[must_use]
    pub const fn new(phase: UploadPhase, bytes_sent: u64, total_bytes: u64) -> Self {
        Self {
            phase,
            bytes_sent,
            total_bytes,
        }
    }

    /// Integer percentage, 100 for empty totals
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = self.bytes_sent.min(self.total_bytes) * 100 / self.total_bytes;
        u8::try_from(pct).unwrap_or(100)
    }
}

/// Status feed entry published while a batch runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadEvent {
    /// A selection began processing
    SelectionStarted {
        /// Position in the batch
        index: usize,
        /// Target platform
        platform: Platform,
        /// Target account
        account_id: String,
    },
    /// A driver reported progress
    Progress {
        /// Position in the batch
        index: usize,
        /// Snapshot
        progress: UploadProgress,
    },
    /// A selection reached a terminal result
    SelectionFinished {
        /// Position in the batch
        index: usize,
        /// Result
        result: SelectionResult,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_requires_title_but_not_caption() {
        let meta = UploadMetadata {
            caption: Some("caption".into()),
            ..UploadMetadata::default()
        };
        assert_eq!(meta.validate_for(Platform::YouTube), Err("title"));
        assert_eq!(meta.validate_for(Platform::TikTok), Ok(()));
        assert_eq!(meta.validate_for(Platform::Facebook), Ok(()));
    }

    #[test]
    fn whitespace_only_fields_count_as_missing() {
        let meta = UploadMetadata {
            title: Some("   ".into()),
            caption: Some(String::new()),
            ..UploadMetadata::default()
        };
        assert!(meta.validate_for(Platform::TikTok).is_err());
        assert!(meta.validate_for(Platform::YouTube).is_err());
    }

    #[test]
    fn hashtags_are_normalized() {
        let meta = UploadMetadata {
            tags: vec!["#rust".into(), "open source".into(), " ".into()],
            ..UploadMetadata::default()
        };
        assert_eq!(meta.hashtags().as_deref(), Some("#rust #opensource"));
    }

    #[test]
    fn percent_clamps() {
        assert_eq!(UploadProgress::new(UploadPhase::Transfer, 50, 200).percent(), 25);
        assert_eq!(UploadProgress::new(UploadPhase::Transfer, 500, 200).percent(), 100);
        assert_eq!(UploadProgress::new(UploadPhase::Transfer, 0, 0).percent(), 100);
    }
}
