// ABOUTME: Application constants organized by domain
// ABOUTME: OAuth ledger windows, token skew, upload budgets, and platform endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! Application constants module

/// Platform API endpoints and default scopes
pub mod endpoints;

/// Service identity used in logs
pub mod service_names {
    /// Server binary and log target name
    pub const REELPOST_SERVER: &str = "reelpost-server";
}

/// OAuth ledger and token lifetime constants
pub mod oauth {
    /// Lifetime of an OAuth state record from creation
    pub const STATE_TTL_SECS: i64 = 600;

    /// Longest configurable state lifetime (one day)
    pub const MAX_STATE_TTL_SECS: i64 = 86_400;

    /// Random bytes behind each state token (256 bits)
    pub const STATE_ENTROPY_BYTES: usize = 32;

    /// Random bytes behind each PKCE code verifier (256 bits, 43 base64url chars)
    pub const CODE_VERIFIER_ENTROPY_BYTES: usize = 32;

    /// Tokens expiring within this window are refreshed before use
    pub const REFRESH_SKEW_SECS: i64 = 300;

    /// Expiry assumed when a provider omits `expires_in`
    pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 3600;

    /// PKCE challenge method
    pub const CODE_CHALLENGE_METHOD: &str = "S256";
}

/// Upload protocol constants
pub mod uploads {
    /// One mebibyte
    pub const MIB: u64 = 1024 * 1024;

    /// Default Facebook transfer chunk size
    pub const FACEBOOK_DEFAULT_CHUNK_SIZE: u64 = 4 * MIB;

    /// Smallest chunk size accepted from configuration
    pub const FACEBOOK_MIN_CHUNK_SIZE: u64 = MIB;

    /// Largest chunk size accepted from configuration (below the request-body ceiling)
    pub const FACEBOOK_MAX_CHUNK_SIZE: u64 = 8 * MIB;

    /// Delay between TikTok publish status polls
    pub const TIKTOK_POLL_INTERVAL_SECS: u64 = 5;

    /// Maximum TikTok status polls before soft success
    pub const TIKTOK_MAX_POLL_ATTEMPTS: u32 = 120;

    /// YouTube title length ceiling
    pub const YOUTUBE_MAX_TITLE_CHARS: usize = 100;

    /// YouTube category used when none is supplied ("People & Blogs")
    pub const YOUTUBE_DEFAULT_CATEGORY: &str = "22";

    /// TikTok title/caption length ceiling
    pub const TIKTOK_MAX_TITLE_CHARS: usize = 2200;

    /// Largest multipart upload the HTTP surface accepts by default
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

    /// Streaming granularity for progress reporting on single-PUT uploads
    pub const PROGRESS_SLICE_BYTES: usize = 256 * 1024;
}
