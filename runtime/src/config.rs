// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service configuration.
//!
//! One [`ServiceConfig`] is built at startup (from CLI flags) and handed to
//! [`crate::service::QueryService::new`]. Nothing reads configuration from
//! globals after that.

use crate::extraction::ExtractionSettings;
use crate::filter::FilterTuning;
use crate::navigation::sort::DEFAULT_SORT_LABEL;
use crate::navigation::target::{build_target_url, DEFAULT_PROVIDER_TEMPLATE, QUERY_PLACEHOLDER};
use crate::renderer::BrowserSettings;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("provider url template must contain {{query}}: {0}")]
    MissingPlaceholder(String),

    #[error("provider url template is not a valid url: {0}")]
    InvalidTemplate(String),

    #[error("sort label must not be empty")]
    EmptySortLabel,

    #[error("pruning threshold must be within [0, 1], got {0}")]
    PruningThreshold(f64),

    #[error("bm25 threshold must be >= 0, got {0}")]
    Bm25Threshold(f64),

    #[error("{0} must be > 0")]
    NotPositive(&'static str),
}

/// Where to search and what to click there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// URL with a `{query}` placeholder.
    pub url_template: String,
    /// Visible label of the sort option to select.
    pub sort_label: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_PROVIDER_TEMPLATE.to_string(),
            sort_label: DEFAULT_SORT_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub provider: ProviderConfig,
    pub browser: BrowserSettings,
    pub extraction: ExtractionSettings,
    pub filter: FilterTuning,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let template = &self.provider.url_template;
        if !template.contains(QUERY_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(template.clone()));
        }
        build_target_url(template, "probe")
            .map_err(|e| ConfigError::InvalidTemplate(format!("{template}: {e}")))?;
        if self.provider.sort_label.trim().is_empty() {
            return Err(ConfigError::EmptySortLabel);
        }

        let f = &self.filter;
        if !(0.0..=1.0).contains(&f.pruning_threshold) {
            return Err(ConfigError::PruningThreshold(f.pruning_threshold));
        }
        if f.bm25_threshold.is_nan() || f.bm25_threshold < 0.0 {
            return Err(ConfigError::Bm25Threshold(f.bm25_threshold));
        }
        if f.k1 <= 0.0 {
            return Err(ConfigError::NotPositive("k1"));
        }
        if f.max_fitted_chars == Some(0) {
            return Err(ConfigError::NotPositive("max_fitted_chars"));
        }

        if self.browser.shutdown_timeout_ms == 0 {
            return Err(ConfigError::NotPositive("shutdown_timeout_ms"));
        }

        let e = &self.extraction;
        if e.timeout_ms == 0 {
            return Err(ConfigError::NotPositive("timeout_ms"));
        }
        if e.cache_max_entries == 0 {
            return Err(ConfigError::NotPositive("cache_max_entries"));
        }
        Ok(())
    }
}
