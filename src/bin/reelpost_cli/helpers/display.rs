// ABOUTME: Output formatting helpers for reelpost-cli
// ABOUTME: Prints linked accounts, link handoffs, upload progress, and batch results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use reelpost_server::{
    models::{CredentialRecord, SelectionResult, UploadEvent},
    oauth2_client::{CompleteLinkResponse, StartLinkResponse},
};

/// Print the data an operator needs to finish linking in a browser
pub fn display_link_start(response: &StartLinkResponse) {
    println!("\nOpen this URL and approve access:");
    println!("{}", "=".repeat(80));
    println!("{}", response.auth_url);
    println!("{}", "=".repeat(80));
    println!("   State:    {}", response.state);
    println!("   Verifier: {}", response.code_verifier);
    println!("\nThe verifier is shown only once. After approving, run:");
    println!(
        "  reelpost-cli link complete --platform <platform> --code <code> --state {} --verifier {}",
        response.state, response.code_verifier
    );
}

/// Print the outcome of a completed link
pub fn display_link_complete(response: &CompleteLinkResponse) {
    let verb = if response.is_new { "Linked" } else { "Relinked" };
    println!(
        "{verb} {} account {} ({})",
        response.platform.display_name(),
        response.account_id,
        response.display_name
    );
}

/// Print linked accounts as a table
pub fn display_accounts(accounts: &[CredentialRecord]) {
    if accounts.is_empty() {
        println!("No linked accounts");
        return;
    }
    println!(
        "{:<10} {:<28} {:<28} {:<17}",
        "PLATFORM", "ACCOUNT", "NAME", "EXPIRES"
    );
    println!("{}", "-".repeat(86));
    for account in accounts {
        let expires = account.expires_at.map_or_else(
            || "unknown".to_owned(),
            |at| at.format("%Y-%m-%d %H:%M").to_string(),
        );
        println!(
            "{:<10} {:<28} {:<28} {:<17}",
            account.platform.slug(),
            account.external_account_id,
            account.display_name,
            expires
        );
    }
    println!("\n{} account(s)", accounts.len());
}

/// Print one status feed entry
pub fn display_event(event: &UploadEvent) {
    match event {
        UploadEvent::SelectionStarted {
            index,
            platform,
            account_id,
        } => println!(
            "[{}] {} {account_id}: starting",
            index + 1,
            platform.display_name()
        ),
        UploadEvent::Progress { index, progress } => println!(
            "[{}] {:?} {}%",
            index + 1,
            progress.phase,
            progress.percent()
        ),
        UploadEvent::SelectionFinished { index, result } => println!(
            "[{}] {}",
            index + 1,
            if result.is_success() { "done" } else { "failed" }
        ),
    }
}

/// Print the per-selection summary
pub fn display_results(results: &[SelectionResult]) {
    println!("\nResults:");
    println!("{}", "=".repeat(80));
    for result in results {
        let marker = if result.is_success() { "OK " } else { "ERR" };
        println!(
            "{marker} {:<9} {:<28} {}",
            result.platform.slug(),
            result.account_id,
            result.message
        );
        if let Some(reference) = &result.reference {
            println!("      reference: {reference}");
        }
        if let Some(code) = &result.error_code {
            println!("      code: {code}");
        }
    }
}
