// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Query orchestration: one query, one browser session, one extraction.

use crate::config::ServiceConfig;
use crate::error::FetchError;
use crate::extraction::{ContentExtractor, RenderedPage};
use crate::filter::{FilterPipeline, FittedDocument};
use crate::navigation::{build_target_url, SortScript};
use crate::renderer::SessionManager;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Runs a query to completion. The transport calls this; tests replace it.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run(&self, query: &str) -> Result<FittedDocument, FetchError>;
}

pub struct QueryService {
    config: ServiceConfig,
    sessions: Arc<dyn SessionManager>,
    extractor: ContentExtractor,
}

impl QueryService {
    pub fn new(config: ServiceConfig, sessions: Arc<dyn SessionManager>) -> Self {
        let extractor = ContentExtractor::new(config.extraction.clone());
        Self {
            config,
            sessions,
            extractor,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Provider URL for `query`.
    pub fn target_url(&self, query: &str) -> Result<Url, FetchError> {
        build_target_url(&self.config.provider.url_template, query)
            .map_err(|e| FetchError::Extraction(format!("could not build target url: {e}")))
    }

    /// Run `query` and keep the whole page result.
    ///
    /// The session is released whatever the extraction outcome, and the
    /// outcome is returned unchanged.
    pub async fn run_page(&self, query: &str) -> Result<RenderedPage, FetchError> {
        if query.is_empty() {
            return Err(FetchError::Input("query must not be empty".into()));
        }
        let url = self.target_url(query)?;
        let script = SortScript::new(self.config.provider.sort_label.clone()).script();
        let pipeline = FilterPipeline::for_query(&self.config.filter, query);

        let session = self.sessions.acquire().await?;
        tracing::debug!(%url, "session acquired");

        let result = self
            .extractor
            .extract(
                session.as_ref(),
                url.as_str(),
                &script,
                &pipeline,
                self.config.extraction.cache_mode,
            )
            .await;

        self.sessions.release(session).await;

        if let Err(e) = &result {
            tracing::warn!(kind = e.kind(), "query failed: {e}");
        }
        result
    }
}

#[async_trait]
impl QueryRunner for QueryService {
    async fn run(&self, query: &str) -> Result<FittedDocument, FetchError> {
        self.run_page(query).await.map(|page| page.document)
    }
}
