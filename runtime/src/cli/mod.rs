// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the shopfit binary.

pub mod doctor;
pub mod fetch_cmd;
pub mod serve;

use crate::config::ServiceConfig;
use crate::extraction::CacheMode;
use crate::filter::ThresholdMode;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Flags shared by every command that builds a [`ServiceConfig`].
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Provider URL template containing {query}
    #[arg(long)]
    pub provider_url: Option<String>,
    /// Visible label of the sort option to click
    #[arg(long)]
    pub sort_label: Option<String>,
    /// Pruning threshold in [0, 1]
    #[arg(long)]
    pub pruning_threshold: Option<f64>,
    /// Pruning threshold mode (fixed, dynamic)
    #[arg(long)]
    pub threshold_mode: Option<ThresholdMode>,
    /// Minimum words an element needs to survive pruning
    #[arg(long)]
    pub min_words: Option<usize>,
    /// Minimum BM25 score a block needs to be kept
    #[arg(long)]
    pub bm25_threshold: Option<f64>,
    /// Upper bound on returned characters
    #[arg(long)]
    pub max_chars: Option<usize>,
    /// Extraction time budget in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Pause after the sort click in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,
    /// Serve repeated queries from an in-memory cache
    #[arg(long)]
    pub use_cache: bool,
    /// Keep links to other hosts in the page content
    #[arg(long)]
    pub keep_external_links: bool,
    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
    /// Do not log browser handler events
    #[arg(long)]
    pub browser_quiet: bool,
    /// Chromium binary to launch
    #[arg(long)]
    pub chromium_path: Option<PathBuf>,
}

impl ConfigArgs {
    /// Apply the flags over the defaults and validate the result.
    pub fn into_config(self) -> Result<ServiceConfig> {
        let mut config = ServiceConfig::default();

        if let Some(url) = self.provider_url {
            config.provider.url_template = url;
        }
        if let Some(label) = self.sort_label {
            config.provider.sort_label = label;
        }

        let filter = &mut config.filter;
        if let Some(t) = self.pruning_threshold {
            filter.pruning_threshold = t;
        }
        if let Some(mode) = self.threshold_mode {
            filter.threshold_mode = mode;
        }
        if self.min_words.is_some() {
            filter.min_word_threshold = self.min_words;
        }
        if let Some(t) = self.bm25_threshold {
            filter.bm25_threshold = t;
        }
        if let Some(max) = self.max_chars {
            filter.max_fitted_chars = Some(max);
        }

        let extraction = &mut config.extraction;
        if let Some(ms) = self.timeout_ms {
            extraction.timeout_ms = ms;
        }
        if let Some(ms) = self.settle_ms {
            extraction.settle_ms = ms;
        }
        if self.use_cache {
            extraction.cache_mode = CacheMode::Use;
        }
        extraction.exclude_external_links = !self.keep_external_links;

        config.browser.headless = !self.headful;
        config.browser.verbose = !self.browser_quiet;
        config.browser.chromium_path = self.chromium_path;

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout
/// stays clean for command output.
pub fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "shopfit={default_level},shopfit_runtime={default_level},tower_http={default_level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
