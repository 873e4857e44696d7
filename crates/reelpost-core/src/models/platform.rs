// ABOUTME: Supported publishing platforms and their string forms
// ABOUTME: Storage tag (TIKTOK), URL slug (tiktok), and case-insensitive parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A video platform an account can be linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    /// TikTok (Open API v2)
    #[serde(alias = "tiktok")]
    TikTok,
    /// YouTube (Google OAuth, Data API v3)
    #[serde(alias = "youtube")]
    YouTube,
    /// Facebook Pages (Graph API)
    #[serde(alias = "facebook")]
    Facebook,
}

impl Platform {
    /// Every supported platform, in display order
    pub const ALL: [Self; 3] = [Self::TikTok, Self::YouTube, Self::Facebook];

    /// Tag persisted in the credential and state tables
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::TikTok => "TIKTOK",
            Self::YouTube => "YOUTUBE",
            Self::Facebook => "FACEBOOK",
        }
    }

    /// Lowercase identifier used in URLs, env prefixes, and logs
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::TikTok => "tiktok",
            Self::YouTube => "youtube",
            Self::Facebook => "facebook",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::TikTok => "TikTok",
            Self::YouTube => "YouTube",
            Self::Facebook => "Facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Self::TikTok),
            "youtube" => Ok(Self::YouTube),
            "facebook" => Ok(Self::Facebook),
            other => Err(AppError::validation(format!("Unsupported platform: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_and_slug_forms() {
        assert_eq!("TIKTOK".parse::<Platform>().ok(), Some(Platform::TikTok));
        assert_eq!("youtube".parse::<Platform>().ok(), Some(Platform::YouTube));
        assert_eq!(" Facebook ".parse::<Platform>().ok(), Some(Platform::Facebook));
        assert!("vimeo".parse::<Platform>().is_err());
    }

    #[test]
    fn serializes_as_storage_tag() {
        let json = serde_json::to_string(&Platform::YouTube).unwrap_or_default();
        assert_eq!(json, "\"YOUTUBE\"");
        let parsed: Platform = serde_json::from_str("\"tiktok\"").unwrap_or(Platform::Facebook);
        assert_eq!(parsed, Platform::TikTok);
    }
}
