// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fake browser sessions and runners shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use shopfit_runtime::renderer::{NavigationResult, RenderContext, Renderer, SessionManager};
use shopfit_runtime::{FetchError, FittedDocument, QueryRunner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A results page with three items, two of them laptops.
pub const LAPTOP_RESULTS: &str = r#"<html><head><title>laptop cheap at DuckDuckGo</title></head><body>
  <header><a href="/">DuckDuckGo</a></header>
  <div class="sort-panel">
    <label><input type="radio" name="Sort by" value="relevance" checked><div>Relevance</div></label>
    <label><input type="radio" name="Sort by" value="price_asc"><div>Price - Low To High</div></label>
  </div>
  <main class="results">
    <p>Acer Aspire 3 laptop, 8GB RAM, $299</p>
    <p>Lenovo IdeaPad laptop, 4GB RAM, $249</p>
    <p>Sign in to save your favourite items</p>
  </main>
  <footer>Privacy | Terms</footer>
</body></html>"#;

/// What a fake tab does at each step.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Serve this HTML; the sort script evaluates to `sort`.
    Serve { html: String, sort: &'static str },
    /// Navigation fails with this message.
    FailNavigation(String),
    /// Navigation never completes.
    HangNavigation,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub tabs_opened: AtomicUsize,
    pub tabs_closed: AtomicUsize,
    pub scripts: Mutex<Vec<String>>,
    pub urls: Mutex<Vec<String>>,
}

impl Calls {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct FakeSessions {
    pub calls: Arc<Calls>,
    behaviour: Behaviour,
    fail_start: bool,
}

impl FakeSessions {
    pub fn serving(html: &str) -> Self {
        Self::with(Behaviour::Serve {
            html: html.to_string(),
            sort: "clicked",
        })
    }

    pub fn with(behaviour: Behaviour) -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            behaviour,
            fail_start: false,
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::serving("")
        }
    }
}

#[async_trait]
impl SessionManager for FakeSessions {
    async fn acquire(&self) -> Result<Box<dyn Renderer>, FetchError> {
        self.calls.acquired.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(FetchError::SessionStart("no chromium binary".into()));
        }
        Ok(Box::new(FakeBrowser {
            calls: Arc::clone(&self.calls),
            behaviour: self.behaviour.clone(),
        }))
    }

    async fn release(&self, session: Box<dyn Renderer>) {
        self.calls.released.fetch_add(1, Ordering::SeqCst);
        let _ = session.shutdown().await;
    }
}

struct FakeBrowser {
    calls: Arc<Calls>,
    behaviour: Behaviour,
}

#[async_trait]
impl Renderer for FakeBrowser {
    async fn new_context(&self) -> anyhow::Result<Box<dyn RenderContext>> {
        self.calls.tabs_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTab {
            calls: Arc::clone(&self.calls),
            behaviour: self.behaviour.clone(),
            url: String::new(),
        }))
    }

    async fn shutdown(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        Calls::count(&self.calls.tabs_opened) - Calls::count(&self.calls.tabs_closed)
    }
}

struct FakeTab {
    calls: Arc<Calls>,
    behaviour: Behaviour,
    url: String,
}

#[async_trait]
impl RenderContext for FakeTab {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> anyhow::Result<NavigationResult> {
        self.calls.urls.lock().unwrap().push(url.to_string());
        if let Behaviour::FailNavigation(msg) = &self.behaviour {
            anyhow::bail!("{msg}");
        }
        if let Behaviour::HangNavigation = &self.behaviour {
            std::future::pending::<()>().await;
        }
        self.url = url.to_string();
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, script: &str) -> anyhow::Result<serde_json::Value> {
        self.calls.scripts.lock().unwrap().push(script.to_string());
        match &self.behaviour {
            Behaviour::Serve { sort, .. } => Ok(serde_json::json!(sort)),
            Behaviour::FailNavigation(_) | Behaviour::HangNavigation => Ok(serde_json::Value::Null),
        }
    }

    async fn get_html(&self) -> anyhow::Result<String> {
        match &self.behaviour {
            Behaviour::Serve { html, .. } => Ok(html.clone()),
            Behaviour::FailNavigation(_) | Behaviour::HangNavigation => Ok(String::new()),
        }
    }

    async fn get_url(&self) -> anyhow::Result<String> {
        Ok(self.url.clone())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.calls.tabs_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Runner with a canned answer that counts its calls.
pub struct StubRunner {
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
    answer: Result<FittedDocument, FetchError>,
}

impl StubRunner {
    pub fn answering(answer: Result<FittedDocument, FetchError>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            answer,
        }
    }
}

#[async_trait]
impl QueryRunner for StubRunner {
    async fn run(&self, query: &str) -> Result<FittedDocument, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        self.answer.clone()
    }
}
