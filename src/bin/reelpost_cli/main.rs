// ABOUTME: Reelpost CLI - operator tool for linking accounts and publishing videos
// ABOUTME: Drives the same flow manager and orchestrator the HTTP server uses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors
//!
//! Usage:
//! ```bash
//! # Start linking a YouTube channel (prints the URL, state, and verifier)
//! reelpost-cli link start --platform youtube
//!
//! # Finish linking with the code from the redirect
//! reelpost-cli link complete --platform youtube --code 4/0Ab... --state S --verifier V
//!
//! # List linked accounts
//! reelpost-cli accounts
//!
//! # Publish one video to two accounts
//! reelpost-cli upload --file clip.mp4 --target youtube:UC123 --target facebook:1020 \
//!     --title "Morning run" --tag running --privacy public
//!
//! # Remove a linked account
//! reelpost-cli unlink --platform tiktok --account open-id
//! ```

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use reelpost_providers::initialize_shared_client;
use reelpost_server::{
    config::ServerConfig,
    errors::AppError,
    logging::LoggingConfig,
    models::{Platform, Privacy, UploadMetadata},
    resources::ServerResources,
};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "reelpost-cli",
    about = "Reelpost operator CLI",
    long_about = "Link TikTok, YouTube, and Facebook accounts and publish one video to many of them."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

fn parse_platform(raw: &str) -> Result<Platform, String> {
    raw.parse().map_err(|e: AppError| e.message)
}

/// Privacy choices accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrivacyArg {
    Public,
    Unlisted,
    Private,
}

impl From<PrivacyArg> for Privacy {
    fn from(arg: PrivacyArg) -> Self {
        match arg {
            PrivacyArg::Public => Self::Public,
            PrivacyArg::Unlisted => Self::Unlisted,
            PrivacyArg::Private => Self::Private,
        }
    }
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Account linking
    Link {
        #[command(subcommand)]
        action: LinkCommand,
    },

    /// List linked accounts
    Accounts {
        /// Only show one platform
        #[arg(long, value_parser = parse_platform)]
        platform: Option<Platform>,
    },

    /// Revoke and remove a linked account
    Unlink {
        /// Platform of the account
        #[arg(long, value_parser = parse_platform)]
        platform: Platform,

        /// Platform-side account id
        #[arg(long)]
        account: String,
    },

    /// Publish one video to one or more linked accounts
    Upload {
        /// Video file to publish
        #[arg(long)]
        file: PathBuf,

        /// Target as platform:account_id (repeatable)
        #[arg(long = "target", required = true)]
        targets: Vec<String>,

        /// Title (required for YouTube)
        #[arg(long)]
        title: Option<String>,

        /// Caption (TikTok and Facebook fall back to the title)
        #[arg(long)]
        caption: Option<String>,

        /// Long description
        #[arg(long)]
        description: Option<String>,

        /// Tag without the leading # (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Visibility after publishing
        #[arg(long, value_enum)]
        privacy: Option<PrivacyArg>,

        /// YouTube category id
        #[arg(long)]
        category_id: Option<String>,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum LinkCommand {
    /// Issue a state and print the authorization URL
    Start {
        /// Platform to link
        #[arg(long, value_parser = parse_platform)]
        platform: Platform,

        /// Ask the platform to show the consent screen again
        #[arg(long)]
        force_consent: bool,
    },

    /// Redeem the redirect parameters and store the account
    Complete {
        /// Platform being linked
        #[arg(long, value_parser = parse_platform)]
        platform: Platform,

        /// Authorization code from the redirect
        #[arg(long)]
        code: String,

        /// State from the redirect
        #[arg(long)]
        state: String,

        /// Verifier printed by `link start`
        #[arg(long)]
        verifier: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    LoggingConfig::for_cli(cli.verbose).init()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    initialize_shared_client(config.http_client);

    debug!("{}", config.summary());
    let resources = ServerResources::from_config(config).await?;

    match cli.command {
        Command::Link { action } => match action {
            LinkCommand::Start {
                platform,
                force_consent,
            } => commands::link::start(&resources, platform, force_consent).await?,
            LinkCommand::Complete {
                platform,
                code,
                state,
                verifier,
            } => commands::link::complete(&resources, platform, code, state, verifier).await?,
        },
        Command::Accounts { platform } => commands::accounts::list(&resources, platform).await?,
        Command::Unlink { platform, account } => {
            commands::accounts::unlink(&resources, platform, &account).await?;
        }
        Command::Upload {
            file,
            targets,
            title,
            caption,
            description,
            tags,
            privacy,
            category_id,
        } => {
            let metadata = UploadMetadata {
                title,
                caption,
                description,
                tags,
                privacy: privacy.map(Privacy::from),
                category_id,
            };
            commands::upload::run(&resources, &file, &targets, metadata).await?;
        }
    }

    Ok(())
}
