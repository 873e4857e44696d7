// ABOUTME: Platform API integrations for TikTok, YouTube, and Facebook Pages
// ABOUTME: Injected HTTP transport, platform descriptors, profile lookups, and upload drivers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! Platform API integrations and the per-platform upload drivers.
//!
//! Every outbound call goes through the [`HttpTransport`] capability, so the
//! drivers and profile lookups can be exercised against [`ScriptedTransport`]
//! without a network.

// Re-export reelpost-core modules so provider files can use `crate::errors::*` etc.
pub use reelpost_core::constants;
pub use reelpost_core::errors;
pub use reelpost_core::models;

/// Platform OAuth descriptors (endpoints, scopes, parameter mapping) as data
pub mod descriptors;
/// Upload driver trait, video files, and the three platform drivers
pub mod drivers;
/// Shared HTTP client for provider API calls
pub mod http_client;
/// Account identity lookups run after a successful code exchange
pub mod profiles;
/// HTTP transport capability and its reqwest and scripted implementations
pub mod transport;

pub use descriptors::{PlatformCapabilities, PlatformDescriptor};
pub use drivers::{
    DriverRegistry, NoopProgress, ProgressListener, PublishRequest, UploadDriver, UploadReceipt,
    UploadSettings, VideoFile,
};
pub use http_client::{initialize_shared_client, shared_client, ClientTimeouts};
pub use profiles::LinkedIdentity;
pub use reelpost_core::errors::provider::{ProviderError, ProviderResult};
pub use transport::{
    HttpMethod, HttpTransport, MultipartField, RequestBody, ReqwestTransport, ScriptedReply,
    ScriptedTransport, TransportRequest, TransportResponse,
};
