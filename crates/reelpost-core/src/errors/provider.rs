// ABOUTME: Structured error types for platform API and transport operations
// ABOUTME: Preserves raw provider payloads and chunk diagnostics for later classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use thiserror::Error;

/// Errors raised while talking to a platform API
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Request never produced a response (DNS, TLS, reset, timeout)
    #[error("{provider} network error: {message}")]
    Network {
        /// Platform identifier
        provider: String,
        /// Transport error text
        message: String,
        /// Bytes of the request body handed to the connection before failing
        bytes_sent: Option<u64>,
    },

    /// Non-success HTTP status, body preserved verbatim
    #[error("{provider} returned HTTP {status}: {body}")]
    HttpStatus {
        /// Platform identifier
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Response could not be parsed or lacked a required field
    #[error("{provider} sent an unexpected response: {message}")]
    InvalidResponse {
        /// Platform identifier
        provider: String,
        /// What was wrong with it
        message: String,
    },

    /// Provider answered successfully at the HTTP level but refused the operation
    #[error("{provider} rejected the request: {reason}")]
    Rejected {
        /// Platform identifier
        provider: String,
        /// Provider's reason string
        reason: String,
        /// Raw provider error object
        payload: Option<serde_json::Value>,
    },

    /// One chunk of a chunked transfer failed; the session is abandoned
    #[error("{provider} chunk {index} (bytes {start_offset}-{end_offset}) failed: {source}")]
    ChunkFailed {
        /// Platform identifier
        provider: String,
        /// Zero-based chunk index
        index: usize,
        /// First byte of the chunk
        start_offset: u64,
        /// One past the last byte of the chunk
        end_offset: u64,
        /// Underlying failure
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Build an `InvalidResponse` error
    #[must_use]
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Build a `Rejected` error
    #[must_use]
    pub fn rejected(
        provider: impl Into<String>,
        reason: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self::Rejected {
            provider: provider.into(),
            reason: reason.into(),
            payload,
        }
    }

    /// Whether the provider deliberately refused (as opposed to a transport fault)
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Rejected { .. } => true,
            Self::ChunkFailed { source, .. } => source.is_rejection(),
            _ => false,
        }
    }

    /// Whether retrying the same request later may succeed
    ///
    /// Only connection failures, throttling, and 5xx statuses qualify.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Raw diagnostic payload for this error, if any
    #[must_use]
    pub fn payload(&self) -> Option<serde_json::Value> {
        match self {
            Self::Network { bytes_sent, .. } => {
                bytes_sent.map(|sent| serde_json::json!({ "bytes_sent": sent }))
            }
            Self::HttpStatus { status, body, .. } => {
                let body = serde_json::from_str::<serde_json::Value>(body)
                    .unwrap_or_else(|_| serde_json::Value::String(body.clone()));
                Some(serde_json::json!({ "status": status, "body": body }))
            }
            Self::InvalidResponse { .. } => None,
            Self::Rejected { payload, .. } => payload.clone(),
            Self::ChunkFailed {
                index,
                start_offset,
                end_offset,
                source,
                ..
            } => Some(serde_json::json!({
                "chunk_index": index,
                "start_offset": start_offset,
                "end_offset": end_offset,
                "cause": source.payload(),
            })),
        }
    }
}

/// Result alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
