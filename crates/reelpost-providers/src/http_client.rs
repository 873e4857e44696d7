// ABOUTME: Process-wide reqwest client shared by every platform transport
// ABOUTME: Timeouts sized for whole-file uploads, configured once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;

/// Timeouts applied to the shared client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// Whole-request ceiling, including body upload
    pub request: Duration,
    /// TCP/TLS connect ceiling
    pub connect: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(300),
            connect: Duration::from_secs(10),
        }
    }
}

static TIMEOUTS: OnceLock<ClientTimeouts> = OnceLock::new();
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Record the timeouts the shared client is built with
///
/// Returns `false` when timeouts were already recorded; the first call wins.
pub fn initialize_shared_client(timeouts: ClientTimeouts) -> bool {
    TIMEOUTS.set(timeouts).is_ok()
}

/// The shared client, built lazily on first use
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let timeouts = TIMEOUTS.get().copied().unwrap_or_default();
        ClientBuilder::new()
            .user_agent(concat!("reelpost/", env!("CARGO_PKG_VERSION")))
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}
