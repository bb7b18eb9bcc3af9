// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! `shopfit serve`: run the HTTP search endpoint.

use crate::cli::ConfigArgs;
use crate::renderer::chromium::{find_chromium, ChromiumSessions};
use crate::renderer::SessionManager;
use crate::rest::{self, AppState};
use crate::service::{QueryRunner, QueryService};
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the service and serve until Ctrl-C.
pub async fn run(addr: SocketAddr, max_concurrent: usize, args: ConfigArgs) -> Result<()> {
    let config = args.into_config()?;
    info!("starting shopfit v{}", env!("CARGO_PKG_VERSION"));

    // Sessions launch per request, so a missing browser only shows up
    // then. Say so now.
    match find_chromium(config.browser.chromium_path.as_ref()) {
        Some(path) => info!("using Chromium at {}", path.display()),
        None => warn!("Chromium not found; searches will fail until one is installed"),
    }
    info!(
        provider = %config.provider.url_template,
        cache = ?config.extraction.cache_mode,
        max_concurrent,
        "service configured"
    );

    let sessions: Arc<dyn SessionManager> =
        Arc::new(ChromiumSessions::new(config.browser.clone()));
    let runner: Arc<dyn QueryRunner> = Arc::new(QueryService::new(config, sessions));
    let state = Arc::new(AppState::new(runner, max_concurrent));

    rest::start(addr, state).await?;
    info!("shopfit stopped");
    Ok(())
}
