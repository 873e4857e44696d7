// ABOUTME: Unified error handling system with standard error codes
// ABOUTME: Classifies every failure crossing a component boundary into one taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # Unified Error Handling System
//!
//! Every error that leaves a component (ledger, OAuth flow, freshness guard,
//! upload driver, orchestrator) is an [`AppError`] carrying one [`ErrorCode`].
//! Provider-level failures are first expressed as [`ProviderError`] and then
//! converted, so raw transport errors never cross a boundary unclassified.

/// Provider and transport level errors
pub mod provider;

pub use provider::{ProviderError, ProviderResult};

#[cfg(feature = "http-response")]
use axum::{
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "http-response")]
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Missing or malformed caller input, no network call made
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    /// Required OAuth callback parameters were absent
    #[serde(rename = "MISSING_PARAMETERS")]
    MissingParameters,
    /// Server misconfiguration (missing client credentials, bad URLs)
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,
    /// Ledger entry or linked account does not exist, is used, or expired
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Supplied PKCE verifier does not match the stored one
    #[serde(rename = "VERIFIER_MISMATCH")]
    VerifierMismatch,
    /// Provider answered but refused the request
    #[serde(rename = "PROVIDER_REJECTED")]
    ProviderRejected,
    /// Transport or HTTP failure talking to a provider
    #[serde(rename = "UPSTREAM_ERROR")]
    UpstreamError,
    /// Stored credential is stale and cannot be refreshed
    #[serde(rename = "REAUTH_REQUIRED")]
    ReauthRequired,
    /// Provider refused the refresh-token grant
    #[serde(rename = "REFRESH_FAILED")]
    RefreshFailed,
    /// Persistence layer failure
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Anything else
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::ValidationError | Self::MissingParameters => 400,
            Self::VerifierMismatch | Self::ReauthRequired | Self::RefreshFailed => 401,
            Self::NotFound => 404,
            Self::ProviderRejected | Self::UpstreamError => 502,
            Self::ConfigurationError | Self::DatabaseError | Self::InternalError => 500,
        }
    }

    /// Stable wire name of the code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::MissingParameters => "MISSING_PARAMETERS",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::VerifierMismatch => "VERIFIER_MISMATCH",
            Self::ProviderRejected => "PROVIDER_REJECTED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::ReauthRequired => "REAUTH_REQUIRED",
            Self::RefreshFailed => "REFRESH_FAILED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ValidationError => "The request is missing required input",
            Self::MissingParameters => "The OAuth callback is missing code, state, or verifier",
            Self::ConfigurationError => "The server is not configured for this platform",
            Self::NotFound => "The requested record was not found or is no longer valid",
            Self::VerifierMismatch => "The PKCE verifier does not match this authorization",
            Self::ProviderRejected => "The platform rejected the request",
            Self::UpstreamError => "The platform could not be reached or returned an error",
            Self::ReauthRequired => "The linked account must be re-authorized",
            Self::RefreshFailed => "The linked account's access token could not be refreshed",
            Self::DatabaseError => "Database operation failed",
            Self::InternalError => "An internal server error occurred",
        }
    }

    /// Whether the stored credential is unusable until the user links again
    #[must_use]
    pub const fn requires_reauth(self) -> bool {
        matches!(self, Self::ReauthRequired | Self::RefreshFailed)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the application
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Raw provider payload or other diagnostics, preserved verbatim
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Create a new error with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach diagnostic details to the error
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Missing or malformed caller input
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Required OAuth callback parameters absent
    #[must_use]
    pub fn missing_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingParameters, message)
    }

    /// Server misconfiguration
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    /// Record does not exist, was used, or expired
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// PKCE verifier mismatch
    #[must_use]
    pub fn verifier_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::VerifierMismatch, message)
    }

    /// Provider refused the request
    #[must_use]
    pub fn provider_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderRejected, message)
    }

    /// Transport or HTTP failure
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    /// Stale credential with no way to refresh
    #[must_use]
    pub fn reauth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReauthRequired, message)
    }

    /// Refresh grant failed
    #[must_use]
    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RefreshFailed, message)
    }

    /// Persistence failure
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Internal failure
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// HTTP status for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// JSON body used by the HTTP surface
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "details": self.details,
            }
        })
    }
}

/// Result alias used across the workspace
pub type AppResult<T> = Result<T, AppError>;

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        let code = if error.is_rejection() {
            ErrorCode::ProviderRejected
        } else {
            ErrorCode::UpstreamError
        };
        let details = error.payload();
        let app = Self::new(code, error.to_string());
        match details {
            Some(details) => app.with_details(details),
            None => app,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(format!("Serialization failed: {error}"))
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        tracing::error!(error = %error, "Database operation failed");
        Self::database(error.to_string())
    }
}

#[cfg(feature = "http-response")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
