// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based sessions using chromiumoxide.

use super::{BrowserSettings, NavigationResult, RenderContext, Renderer, SessionManager};
use crate::error::FetchError;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long to wait for the browser process to exit after close or kill.
const EXIT_WAIT: Duration = Duration::from_secs(5);

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. Explicit configuration
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // 2. SHOPFIT_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("SHOPFIT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. ~/.shopfit/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".shopfit/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".shopfit/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".shopfit/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".shopfit/chromium/chrome-linux64/chrome"),
                home.join(".shopfit/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 4. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 5. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches one Chromium process per acquired session.
pub struct ChromiumSessions {
    settings: BrowserSettings,
}

impl ChromiumSessions {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");

        builder = if self.settings.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        if let Some(path) = find_chromium(self.settings.chromium_path.as_ref()) {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))
    }
}

#[async_trait]
impl SessionManager for ChromiumSessions {
    async fn acquire(&self) -> Result<Box<dyn Renderer>, FetchError> {
        let config = self
            .browser_config()
            .map_err(|e| FetchError::SessionStart(format!("{e:#}")))?;
        let renderer = ChromiumRenderer::launch(config, self.settings.verbose)
            .await
            .map_err(|e| FetchError::SessionStart(format!("{e:#}")))?;
        Ok(Box::new(renderer))
    }

    async fn release(&self, session: Box<dyn Renderer>) {
        let open = session.active_contexts();
        if open > 0 {
            warn!(target: "shopfit::browser", open, "releasing session with open contexts");
        }
        let limit = Duration::from_millis(self.settings.shutdown_timeout_ms);
        match tokio::time::timeout(limit, session.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(target: "shopfit::browser", "browser shutdown failed: {e:#}"),
            // Dropping the session kills the browser process.
            Err(_) => warn!(
                target: "shopfit::browser",
                timeout_ms = self.settings.shutdown_timeout_ms,
                "browser shutdown timed out"
            ),
        }
    }
}

/// A launched Chromium instance and its CDP handler task.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    async fn launch(config: BrowserConfig, verbose: bool) -> Result<Self> {
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    if verbose {
                        debug!(target: "shopfit::browser", "cdp handler error: {e}");
                    }
                }
            }
        });

        if verbose {
            info!(target: "shopfit::browser", "Chromium session started");
        }

        Ok(Self {
            browser,
            handler,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        let ChromiumRenderer {
            mut browser,
            handler,
            ..
        } = *self;

        let closed = browser.close().await.context("failed to close browser");
        if closed.is_err() {
            // A browser that ignores close is killed before it is reaped.
            if let Some(Err(e)) = browser.kill().await {
                warn!(target: "shopfit::browser", "failed to kill browser: {e}");
            }
        }
        let waited = tokio::time::timeout(EXIT_WAIT, browser.wait()).await;
        handler.abort();

        closed?;
        waited
            .map_err(|_| anyhow::anyhow!("browser did not exit within {}ms", EXIT_WAIT.as_millis()))?
            .context("failed to wait for browser exit")?;
        debug!(target: "shopfit::browser", "Chromium session released");
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;

                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms: start.elapsed().as_millis() as u64,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        // Scripts that return nothing evaluate to `undefined`.
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn get_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        result
            .into_value::<String>()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}
