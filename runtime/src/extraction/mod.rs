// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page extraction: drive one tab through navigate, sort, capture, and
//! filter the captured content.
//!
//! The browser-facing half is async and talks to a [`RenderContext`]. The
//! parse and filter half is synchronous and runs once the HTML is in hand,
//! so no DOM handles are held across an await point.

pub mod cache;
pub mod dom;

use crate::error::FetchError;
use crate::filter::{FilterPipeline, FilterStats, FittedDocument};
use crate::navigation::{PageScript, SortOutcome};
use crate::renderer::{RenderContext, Renderer};
use anyhow::Context;
use cache::PageCache;
use chrono::{DateTime, Utc};
use dom::PageLink;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Whether extraction may be served from [`PageCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Always render fresh.
    #[default]
    Bypass,
    /// Serve fresh cache entries and store new renders.
    Use,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Budget for the whole extraction, navigation through filtering.
    pub timeout_ms: u64,
    /// Pause after the page script so a re-sort can finish rendering.
    pub settle_ms: u64,
    pub cache_mode: CacheMode,
    /// Drop anchors to other hosts from the content tree.
    pub exclude_external_links: bool,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            settle_ms: 1_000,
            cache_mode: CacheMode::Bypass,
            exclude_external_links: true,
            cache_ttl_secs: 300,
            cache_max_entries: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionTiming {
    pub navigation_ms: u64,
    pub settle_ms: u64,
    pub filter_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub success: bool,
    pub sort: SortOutcome,
    pub from_cache: bool,
    pub title: Option<String>,
    pub external_links_seen: usize,
    pub timing: ExtractionTiming,
    pub stats: FilterStats,
    pub fetched_at: DateTime<Utc>,
}

/// A fully extracted page.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    /// URL the browser was sent to.
    pub url: String,
    /// URL the tab ended on.
    pub final_url: String,
    #[serde(skip)]
    pub html: String,
    pub links: Vec<PageLink>,
    pub document: FittedDocument,
    pub metadata: ExtractionMetadata,
}

impl RenderedPage {
    #[cfg(test)]
    pub(crate) fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            html: String::new(),
            links: Vec::new(),
            document: FittedDocument::default(),
            metadata: ExtractionMetadata {
                success: true,
                sort: SortOutcome::Absent,
                from_cache: false,
                title: None,
                external_links_seen: 0,
                timing: ExtractionTiming::default(),
                stats: FilterStats::default(),
                fetched_at: Utc::now(),
            },
        }
    }
}

/// What the browser half hands to the filter half.
struct Capture {
    final_url: String,
    html: String,
    sort: SortOutcome,
    navigation_ms: u64,
    settle_ms: u64,
}

pub struct ContentExtractor {
    settings: ExtractionSettings,
    cache: Arc<Mutex<PageCache>>,
}

impl ContentExtractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        let cache = PageCache::new(
            Duration::from_secs(settings.cache_ttl_secs),
            settings.cache_max_entries,
        );
        Self {
            settings,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Extract `url` in a fresh tab of `renderer`.
    ///
    /// The tab is closed on every path that reaches the end of the
    /// browser half. When the time budget runs out first the tab is
    /// abandoned and goes away with its session.
    pub async fn extract(
        &self,
        renderer: &dyn Renderer,
        url: &str,
        script: &PageScript,
        pipeline: &FilterPipeline,
        cache_mode: CacheMode,
    ) -> Result<RenderedPage, FetchError> {
        let key = PageCache::key(url, script.version);
        if cache_mode == CacheMode::Use {
            if let Some(mut page) = self.cache.lock().await.get(&key) {
                tracing::debug!(url, "serving cached page");
                page.metadata.from_cache = true;
                return Ok(page);
            }
        }

        let budget = Duration::from_millis(self.settings.timeout_ms);
        let page = tokio::time::timeout(budget, self.render(renderer, url, script, pipeline))
            .await
            .map_err(|_| FetchError::Timeout(self.settings.timeout_ms))??;

        if cache_mode == CacheMode::Use {
            self.cache.lock().await.put(&key, page.clone());
        }
        Ok(page)
    }

    async fn render(
        &self,
        renderer: &dyn Renderer,
        url: &str,
        script: &PageScript,
        pipeline: &FilterPipeline,
    ) -> Result<RenderedPage, FetchError> {
        let started = Instant::now();

        let mut context = renderer
            .new_context()
            .await
            .context("failed to open tab")
            .map_err(FetchError::extraction)?;
        let captured = self.capture(context.as_mut(), url, script).await;
        if let Err(e) = context.close().await {
            tracing::warn!("failed to close tab: {e:#}");
        }
        let capture = captured?;

        let filter_started = Instant::now();
        let tree = dom::parse_page(
            &capture.html,
            &capture.final_url,
            self.settings.exclude_external_links,
        );
        let dom::PageTree {
            title,
            root,
            internal_links: links,
            external_link_count: external_links_seen,
        } = tree;
        let outcome = pipeline.apply(root);
        let filter_ms = filter_started.elapsed().as_millis() as u64;

        tracing::info!(
            url,
            final_url = %capture.final_url,
            sort = capture.sort.as_str(),
            blocks = outcome.stats.blocks_retained,
            chars = outcome.document.markdown().len(),
            "extracted page"
        );

        Ok(RenderedPage {
            url: url.to_string(),
            final_url: capture.final_url,
            html: capture.html,
            links,
            document: outcome.document,
            metadata: ExtractionMetadata {
                success: true,
                sort: capture.sort,
                from_cache: false,
                title,
                external_links_seen,
                timing: ExtractionTiming {
                    navigation_ms: capture.navigation_ms,
                    settle_ms: capture.settle_ms,
                    filter_ms,
                    total_ms: started.elapsed().as_millis() as u64,
                },
                stats: outcome.stats,
                fetched_at: Utc::now(),
            },
        })
    }

    async fn capture(
        &self,
        context: &mut dyn RenderContext,
        url: &str,
        script: &PageScript,
    ) -> Result<Capture, FetchError> {
        let nav = context
            .navigate(url, self.settings.timeout_ms)
            .await
            .with_context(|| format!("navigation to {url} failed"))
            .map_err(FetchError::extraction)?;

        let value = context
            .execute_js(&script.source)
            .await
            .with_context(|| format!("page script '{}' failed", script.name))
            .map_err(FetchError::extraction)?;
        let sort = SortOutcome::from_script_value(&value);
        tracing::debug!(
            script = script.name,
            version = script.version,
            outcome = sort.as_str(),
            "page script evaluated"
        );

        let settle_ms = self.settings.settle_ms;
        if settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(settle_ms)).await;
        }

        let html = context
            .get_html()
            .await
            .context("failed to read page content")
            .map_err(FetchError::extraction)?;
        let final_url = match context.get_url().await {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("could not read final url: {e:#}");
                nav.final_url
            }
        };

        Ok(Capture {
            final_url,
            html,
            sort,
            navigation_ms: nav.load_time_ms,
            settle_ms,
        })
    }
}
