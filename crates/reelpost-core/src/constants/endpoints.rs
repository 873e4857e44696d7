// ABOUTME: Platform API endpoints and default OAuth scopes
// ABOUTME: TikTok v2 Open API, Google OAuth / YouTube Data API v3, Facebook Graph API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

/// TikTok Open API v2
pub mod tiktok {
    /// Browser authorization endpoint
    pub const AUTH_URL: &str = "https://www.tiktok.com/v2/auth/authorize/";
    /// Token endpoint (authorization_code and refresh_token grants)
    pub const TOKEN_URL: &str = "https://open.tiktokapis.com/v2/oauth/token/";
    /// Token revocation endpoint
    pub const REVOKE_URL: &str = "https://open.tiktokapis.com/v2/oauth/revoke/";
    /// Open API base for authenticated calls
    pub const API_BASE: &str = "https://open.tiktokapis.com/v2";
    /// Direct-post init endpoint
    pub const DIRECT_POST_INIT_URL: &str =
        "https://open.tiktokapis.com/v2/post/publish/video/init/";
    /// Inbox (draft) upload init endpoint, the only one available to sandbox apps
    pub const INBOX_INIT_URL: &str =
        "https://open.tiktokapis.com/v2/post/publish/inbox/video/init/";
    /// Publish status endpoint
    pub const STATUS_URL: &str = "https://open.tiktokapis.com/v2/post/publish/status/fetch/";
    /// Default scopes
    pub const DEFAULT_SCOPES: &[&str] = &["user.info.basic", "video.upload", "video.publish"];
}

/// Google OAuth and YouTube Data API v3
pub mod youtube {
    /// Browser authorization endpoint
    pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
    /// Token endpoint
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
    /// Token revocation endpoint
    pub const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
    /// Data API base for authenticated calls
    pub const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
    /// Resumable upload endpoint
    pub const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
    /// Default scopes
    pub const DEFAULT_SCOPES: &[&str] = &[
        "https://www.googleapis.com/auth/youtube.upload",
        "https://www.googleapis.com/auth/youtube.readonly",
    ];
}

/// Facebook Graph API
pub mod facebook {
    /// Graph API version used when none is configured
    pub const DEFAULT_GRAPH_VERSION: &str = "v19.0";
    /// Browser dialog host
    pub const DIALOG_HOST: &str = "https://www.facebook.com";
    /// Graph API host
    pub const GRAPH_HOST: &str = "https://graph.facebook.com";
    /// Graph video upload host
    pub const GRAPH_VIDEO_HOST: &str = "https://graph-video.facebook.com";
    /// Default scopes
    pub const DEFAULT_SCOPES: &[&str] = &[
        "pages_show_list",
        "pages_read_engagement",
        "pages_manage_posts",
        "publish_video",
    ];
}
