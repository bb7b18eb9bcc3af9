// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser session abstraction.
//!
//! A [`SessionManager`] hands out one [`Renderer`] (a running browser) per
//! request and takes it back when the request is done. A [`RenderContext`]
//! is a single tab inside that browser. The Chromium implementation lives
//! in [`chromium`]; tests substitute their own.

pub mod chromium;

use crate::error::FetchError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Launch options for a browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window.
    pub headless: bool,
    /// Log browser-side handler events.
    pub verbose: bool,
    /// Explicit Chromium binary. Discovered when unset.
    pub chromium_path: Option<PathBuf>,
    /// Upper bound on releasing a session. A browser still running after
    /// this is killed.
    pub shutdown_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            verbose: true,
            chromium_path: None,
            shutdown_timeout_ms: 10_000,
        }
    }
}

/// Hands out browser sessions scoped to a single request.
///
/// Callers must pass every acquired session back to [`release`], on the
/// error path as well as the happy path.
///
/// [`release`]: SessionManager::release
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Start a browser. Fails with [`FetchError::SessionStart`].
    async fn acquire(&self) -> Result<Box<dyn Renderer>, FetchError>;
    /// Tear the browser down. Cleanup problems are logged, never returned.
    async fn release(&self, session: Box<dyn Renderer>);
}

/// A running browser that can open rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine and its process.
    async fn shutdown(self: Box<Self>) -> Result<()>;
    /// Number of currently open contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
