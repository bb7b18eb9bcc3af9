// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! `shopfit fetch <query>`: run one query without the HTTP layer.

use crate::cli::ConfigArgs;
use crate::renderer::chromium::ChromiumSessions;
use crate::service::QueryService;
use anyhow::Result;
use std::sync::Arc;

/// Print the fitted markdown, or the whole page result with `--json`.
pub async fn run(query: &str, json: bool, args: ConfigArgs) -> Result<()> {
    let config = args.into_config()?;
    let sessions = Arc::new(ChromiumSessions::new(config.browser.clone()));
    let service = QueryService::new(config, sessions);

    let page = service.run_page(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.document.is_empty() {
        eprintln!("No content matched '{query}'.");
    } else {
        println!("{}", page.document.markdown());
    }
    eprintln!(
        "{} blocks from {} ({} ms, sort: {})",
        page.metadata.stats.blocks_retained,
        page.final_url,
        page.metadata.timing.total_ms,
        page.metadata.sort.as_str()
    );
    Ok(())
}
