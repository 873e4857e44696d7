// ABOUTME: Batch upload command for reelpost-cli
// ABOUTME: Parses platform:account targets, streams progress, and prints per-selection results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use reelpost_providers::VideoFile;
use reelpost_server::{
    errors::{AppError, AppResult},
    models::{Platform, Selection, UploadEvent, UploadMetadata},
    resources::ServerResources,
};
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::helpers::display::{display_event, display_results};

/// Parse a `platform:account_id` target
fn parse_target(raw: &str) -> AppResult<(Platform, String)> {
    let (platform, account_id) = raw.split_once(':').ok_or_else(|| {
        AppError::validation(format!(
            "Target '{raw}' must look like platform:account_id"
        ))
    })?;
    Ok((platform.parse()?, account_id.trim().to_owned()))
}

/// Wait for the progress printer; returns whether it ran to completion
async fn finish_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Progress printer stopped before draining all events");
            false
        }
    }
}

/// Publish `file` to every target with the same metadata
pub async fn run(
    resources: &ServerResources,
    file: &Path,
    targets: &[String],
    metadata: UploadMetadata,
) -> AppResult<()> {
    let selections = targets
        .iter()
        .map(|raw| {
            parse_target(raw).map(|(platform, account_id)| Selection {
                platform,
                account_id,
                metadata: metadata.clone(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let video = VideoFile::open(file).await?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<UploadEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            display_event(&event);
        }
    });

    let results = resources
        .orchestrator
        .upload_to_selections(&video, &selections, Some(&events_tx))
        .await;
    drop(events_tx);
    // The printer ends once the sender is dropped
    finish_printer(printer).await;

    let results = results?;
    display_results(&results);

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        return Err(AppError::upstream(format!(
            "{failed} of {} selection(s) failed",
            results.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;

    #[test]
    fn targets_split_on_the_first_colon() {
        let (platform, account) = parse_target("youtube:UC123").unwrap();
        assert_eq!(platform, Platform::YouTube);
        assert_eq!(account, "UC123");
        assert!(parse_target("UC123").is_err());
        assert!(parse_target("vimeo:1").is_err());
    }

    #[tokio::test]
    async fn printer_join_failure_is_reported_not_propagated() {
        let clean = tokio::spawn(async {});
        assert!(finish_printer(clean).await);

        let cancelled = tokio::spawn(future::pending::<()>());
        cancelled.abort();
        assert!(!finish_printer(cancelled).await);
    }
}
