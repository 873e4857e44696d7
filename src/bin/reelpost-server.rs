// ABOUTME: HTTP server binary for account linking and batch video publishing
// ABOUTME: Loads env configuration, opens the database, and serves the axum router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # Reelpost Server Binary
//!
//! Starts the HTTP surface with the configured sqlite database and the shared
//! platform HTTP client. Stops gracefully on Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use reelpost_server::{
    config::ServerConfig, logging, resources::ServerResources, routes,
};
use reelpost_providers::initialize_shared_client;
use std::future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "reelpost-server")]
#[command(about = "Link video platform accounts and publish one video to many of them")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override listen address
    #[arg(long)]
    host: Option<String>,
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C; running until killed");
        future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    logging::init_from_env()?;
    info!("Starting reelpost server");
    info!("{}", config.summary());

    if !initialize_shared_client(config.http_client) {
        warn!("Shared HTTP client was already initialized; keeping existing timeouts");
    }

    let configured = config.configured_platforms();
    if configured.is_empty() {
        warn!("No platform has OAuth credentials; linking will fail until they are set");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.http_port))?;

    let resources = Arc::new(ServerResources::from_config(config).await?);
    let app = routes::router(resources);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}
