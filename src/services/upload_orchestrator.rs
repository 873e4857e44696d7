// ABOUTME: Drives one video through every selected (platform, account) pair in order
// ABOUTME: Each selection fails independently; panics and errors become that selection's result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # Upload Orchestrator
//!
//! Selections are validated up front and then processed strictly one after
//! another. Every selection ends with exactly one [`SelectionResult`]; the
//! batch never stops early. Progress and lifecycle events are published to
//! an optional unbounded channel so a caller can render a live feed.

use super::token_freshness::TokenFreshnessGuard;
use crate::database::CredentialStore;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{Selection, SelectionResult, UploadEvent, UploadProgress};
use futures_util::FutureExt;
use reelpost_providers::{
    DriverRegistry, ProgressListener, PublishRequest, UploadReceipt, VideoFile,
};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, info_span, warn, Instrument};

/// Forwards driver progress to the event channel, tagged with the selection index
struct EventForwarder {
    index: usize,
    events: Option<UnboundedSender<UploadEvent>>,
}

impl ProgressListener for EventForwarder {
    fn on_progress(&self, progress: UploadProgress) {
        if let Some(events) = &self.events {
            // A closed receiver only means nobody is watching
            let _ = events.send(UploadEvent::Progress {
                index: self.index,
                progress,
            });
        }
    }
}

fn emit(events: Option<&UnboundedSender<UploadEvent>>, event: UploadEvent) {
    if let Some(events) = events {
        let _ = events.send(event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "driver panicked".to_owned())
}

/// Check every selection before any network call
///
/// # Errors
///
/// Returns `ValidationError` listing every incomplete selection
pub fn validate_selections(selections: &[Selection]) -> AppResult<()> {
    if selections.is_empty() {
        return Err(AppError::validation("Select at least one account"));
    }
    let problems: Vec<String> = selections
        .iter()
        .enumerate()
        .filter_map(|(index, selection)| {
            if selection.account_id.trim().is_empty() {
                return Some(format!(
                    "selection {} ({}): account id is required",
                    index + 1,
                    selection.platform.display_name()
                ));
            }
            selection
                .metadata
                .validate_for(selection.platform)
                .err()
                .map(|field| {
                    format!(
                        "selection {} ({} {}): {field} is required",
                        index + 1,
                        selection.platform.display_name(),
                        selection.account_id
                    )
                })
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(problems.join("; ")))
    }
}

/// Sequential multi-account publisher
pub struct UploadOrchestrator {
    credentials: Arc<dyn CredentialStore>,
    guard: TokenFreshnessGuard,
    drivers: DriverRegistry,
}

impl fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("guard", &self.guard)
            .field("drivers", &self.drivers)
            .finish_non_exhaustive()
    }
}

impl UploadOrchestrator {
    /// Create a new orchestrator
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        guard: TokenFreshnessGuard,
        drivers: DriverRegistry,
    ) -> Self {
        Self {
            credentials,
            guard,
            drivers,
        }
    }

    /// Publish `video` to every selection, in order
    ///
    /// Returns one result per selection in input order. Duplicate selections
    /// are processed and reported independently.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` before any upload if a selection is incomplete
    pub async fn upload_to_selections(
        &self,
        video: &VideoFile,
        selections: &[Selection],
        events: Option<&UnboundedSender<UploadEvent>>,
    ) -> AppResult<Vec<SelectionResult>> {
        validate_selections(selections)?;
        info!(
            selections = selections.len(),
            file_name = %video.file_name,
            size = video.size(),
            "Starting batch upload"
        );

        let mut results = Vec::with_capacity(selections.len());
        for (index, selection) in selections.iter().enumerate() {
            emit(
                events,
                UploadEvent::SelectionStarted {
                    index,
                    platform: selection.platform,
                    account_id: selection.account_id.clone(),
                },
            );

            let span = info_span!(
                "upload_selection",
                index,
                platform = %selection.platform,
                account_id = %selection.account_id
            );
            let result = self
                .run_selection(index, video, selection, events)
                .instrument(span)
                .await;

            emit(
                events,
                UploadEvent::SelectionFinished {
                    index,
                    result: result.clone(),
                },
            );
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "Batch upload finished"
        );
        Ok(results)
    }

    async fn run_selection(
        &self,
        index: usize,
        video: &VideoFile,
        selection: &Selection,
        events: Option<&UnboundedSender<UploadEvent>>,
    ) -> SelectionResult {
        let outcome = AssertUnwindSafe(self.publish_one(index, video, selection, events))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(receipt)) => {
                info!(
                    reference = ?receipt.reference,
                    confirmed = receipt.confirmed,
                    "Selection uploaded"
                );
                SelectionResult::success(selection, receipt.message, receipt.reference)
            }
            Ok(Err(failure)) => {
                if failure.code.requires_reauth() {
                    warn!(code = failure.code.as_str(), error = %failure.message, "Account needs relinking");
                } else {
                    warn!(code = failure.code.as_str(), error = %failure.message, "Selection failed");
                }
                SelectionResult::error(
                    selection,
                    failure.message,
                    Some(failure.code.as_str().to_owned()),
                )
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "Upload driver panicked");
                SelectionResult::error(
                    selection,
                    format!("Upload failed unexpectedly: {message}"),
                    Some(ErrorCode::InternalError.as_str().to_owned()),
                )
            }
        }
    }

    async fn publish_one(
        &self,
        index: usize,
        video: &VideoFile,
        selection: &Selection,
        events: Option<&UnboundedSender<UploadEvent>>,
    ) -> AppResult<UploadReceipt> {
        let record = self
            .credentials
            .get(selection.platform, &selection.account_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No linked {} account {}",
                    selection.platform.display_name(),
                    selection.account_id
                ))
            })?;

        let access_token = self.guard.ensure_fresh(&record).await?;

        let driver = self.drivers.get(selection.platform).ok_or_else(|| {
            AppError::internal(format!(
                "No upload driver registered for {}",
                selection.platform.display_name()
            ))
        })?;

        let listener: Arc<dyn ProgressListener> = Arc::new(EventForwarder {
            index,
            events: events.cloned(),
        });
        let request = PublishRequest {
            account_id: &selection.account_id,
            access_token: &access_token,
            video,
            metadata: &selection.metadata,
        };
        driver
            .publish(request, listener)
            .await
            .map_err(AppError::from)
    }
}
