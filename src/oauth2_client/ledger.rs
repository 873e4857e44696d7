// ABOUTME: OAuth state ledger issuing CSRF state tokens bound to PKCE verifiers
// ABOUTME: Redemption is single-use, TTL-bounded, platform-scoped, and constant-time on the verifier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # State Ledger
//!
//! One ledger serves every platform. A state is redeemable only by the
//! platform that issued it, only once, and only within the TTL. How a
//! verifier mismatch affects the state is governed by [`MismatchPolicy`]:
//!
//! - `Retain` compares first and leaves the state redeemable on mismatch
//! - `Burn` marks the state used first, so a mismatch consumes it

use super::client::{random_token, PkceParams};
use crate::config::OAuthLedgerConfig;
use crate::constants::oauth::{CODE_VERIFIER_ENTROPY_BYTES, STATE_ENTROPY_BYTES};
use crate::database::OAuthStateStore;
use crate::errors::{AppError, AppResult};
use crate::models::{MismatchPolicy, OAuthStateRecord, Platform, StateContext};
use chrono::{Duration, Utc};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

/// A freshly issued state and its PKCE pair
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedState {
    /// Opaque state token
    pub state: String,
    /// Verifier the caller must present on completion
    pub code_verifier: String,
    /// Challenge sent to the platform
    pub code_challenge: String,
}

impl fmt::Debug for IssuedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedState")
            .field("state", &self.state)
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// Server-side ledger of in-flight linking flows
pub struct StateLedger {
    store: Arc<dyn OAuthStateStore>,
    ttl: Duration,
    policy: MismatchPolicy,
}

impl fmt::Debug for StateLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateLedger")
            .field("ttl_secs", &self.ttl.num_seconds())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn verifier_matches(stored: &str, supplied: &str) -> bool {
    stored.as_bytes().ct_eq(supplied.as_bytes()).into()
}

impl StateLedger {
    /// Ledger over `store` with the configured TTL and mismatch policy
    #[must_use]
    pub fn new(store: Arc<dyn OAuthStateStore>, config: OAuthLedgerConfig) -> Self {
        Self {
            store,
            ttl: config.state_ttl,
            policy: config.mismatch_policy,
        }
    }

    /// Issue a new state for `platform`
    ///
    /// Records past the TTL are purged first; a purge failure is logged and
    /// does not block issuance.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the new record cannot be stored
    pub async fn create(&self, platform: Platform, context: StateContext) -> AppResult<IssuedState> {
        let now = Utc::now();
        match self.store.delete_older_than(now - self.ttl).await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "Expired OAuth states purged"),
            Err(error) => warn!(error = %error, "OAuth state housekeeping failed"),
        }

        let pkce = PkceParams::generate(CODE_VERIFIER_ENTROPY_BYTES);
        let record = OAuthStateRecord {
            state: random_token(STATE_ENTROPY_BYTES),
            platform,
            code_verifier: pkce.code_verifier,
            code_challenge: pkce.code_challenge,
            context,
            created_at: now,
            used: false,
            used_at: None,
        };
        self.store.insert(&record).await?;
        info!(platform = %platform, "OAuth state issued");

        Ok(IssuedState {
            state: record.state,
            code_verifier: record.code_verifier,
            code_challenge: record.code_challenge,
        })
    }

    /// Redeem `state` for `platform` with the caller's `code_verifier`
    ///
    /// # Errors
    ///
    /// - `MissingParameters` if either input is empty
    /// - `NotFound` if the state is unknown, used, expired, or belongs to another platform
    /// - `VerifierMismatch` if the verifier differs from the stored one
    pub async fn consume(
        &self,
        platform: Platform,
        state: &str,
        code_verifier: &str,
    ) -> AppResult<StateContext> {
        if state.is_empty() || code_verifier.is_empty() {
            return Err(AppError::missing_parameters(
                "state and code_verifier are required",
            ));
        }

        let now = Utc::now();
        let not_before = now - self.ttl;
        let not_found = || AppError::not_found("OAuth state is unknown, expired, or already used");

        let record = self
            .store
            .find_active(state, platform, not_before)
            .await?
            .ok_or_else(not_found)?;
        let matches = verifier_matches(&record.code_verifier, code_verifier);

        match self.policy {
            MismatchPolicy::Retain => {
                if !matches {
                    warn!(platform = %platform, "PKCE verifier mismatch; state retained");
                    return Err(AppError::verifier_mismatch("PKCE code verifier does not match"));
                }
                if !self.store.mark_used(state, platform, not_before, now).await? {
                    return Err(not_found());
                }
            }
            MismatchPolicy::Burn => {
                if !self.store.mark_used(state, platform, not_before, now).await? {
                    return Err(not_found());
                }
                if !matches {
                    warn!(platform = %platform, "PKCE verifier mismatch; state burned");
                    return Err(AppError::verifier_mismatch("PKCE code verifier does not match"));
                }
            }
        }

        info!(platform = %platform, "OAuth state redeemed");
        Ok(record.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_comparison_requires_exact_bytes() {
        assert!(verifier_matches("abc", "abc"));
        assert!(!verifier_matches("abc", "abd"));
        assert!(!verifier_matches("abc", "abcd"));
    }
}
