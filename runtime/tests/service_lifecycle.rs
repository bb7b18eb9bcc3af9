// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! QueryService against fake browser sessions.

mod common;

use common::{Behaviour, Calls, FakeSessions, LAPTOP_RESULTS};
use shopfit_runtime::navigation::SortOutcome;
use shopfit_runtime::{FetchError, QueryRunner, QueryService, ServiceConfig};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.extraction.settle_ms = 0;
    config
}

#[tokio::test]
async fn laptop_query_returns_matching_blocks_in_order() {
    let sessions = Arc::new(FakeSessions::serving(LAPTOP_RESULTS));
    let service = QueryService::new(config(), sessions.clone());

    let doc = assert_ok!(service.run("laptop").await);
    assert_eq!(
        doc.markdown(),
        "Acer Aspire 3 laptop, 8GB RAM, $299\n\nLenovo IdeaPad laptop, 4GB RAM, $249"
    );
    let indices: Vec<usize> = doc.blocks().iter().map(|b| b.index).collect();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));

    let calls = &sessions.calls;
    assert_eq!(Calls::count(&calls.acquired), 1);
    assert_eq!(Calls::count(&calls.released), 1);
    assert_eq!(Calls::count(&calls.tabs_closed), 1);
    assert_eq!(
        calls.urls.lock().unwrap().as_slice(),
        ["https://duckduckgo.com/?q=laptop+cheap&iax=shopping&ia=shopping"]
    );
    assert!(calls.scripts.lock().unwrap()[0].contains("Price - Low To High"));
}

#[tokio::test]
async fn session_released_when_extraction_fails() {
    let sessions = Arc::new(FakeSessions::with(Behaviour::FailNavigation(
        "net::ERR_TIMED_OUT (timeout)".into(),
    )));
    let service = QueryService::new(config(), sessions.clone());

    let err = assert_err!(service.run("laptop").await);
    assert!(matches!(&err, FetchError::Extraction(msg) if msg.contains("timeout")));
    assert_eq!(err.status_code(), 500);

    assert_eq!(Calls::count(&sessions.calls.acquired), 1);
    assert_eq!(Calls::count(&sessions.calls.released), 1);
    assert_eq!(Calls::count(&sessions.calls.tabs_closed), 1);
}

#[tokio::test]
async fn session_released_when_extraction_times_out() {
    let sessions = Arc::new(FakeSessions::with(Behaviour::HangNavigation));
    let mut config = config();
    config.extraction.timeout_ms = 50;
    let service = QueryService::new(config, sessions.clone());

    let err = assert_err!(service.run("laptop").await);
    assert_eq!(err, FetchError::Timeout(50));
    assert_eq!(err.status_code(), 500);

    assert_eq!(Calls::count(&sessions.calls.acquired), 1);
    assert_eq!(Calls::count(&sessions.calls.released), 1);
    // The hung tab is abandoned, not closed; releasing the session reclaims it.
    assert_eq!(Calls::count(&sessions.calls.tabs_closed), 0);
}

#[tokio::test]
async fn session_start_failure_is_not_retried() {
    let sessions = Arc::new(FakeSessions::failing_start());
    let service = QueryService::new(config(), sessions.clone());

    let err = assert_err!(service.run("laptop").await);
    assert_eq!(err, FetchError::SessionStart("no chromium binary".into()));
    assert_eq!(Calls::count(&sessions.calls.acquired), 1);
    assert_eq!(Calls::count(&sessions.calls.released), 0);
}

#[tokio::test]
async fn missing_sort_control_still_yields_page() {
    let html = LAPTOP_RESULTS.replace("Price - Low To High", "Newest first");
    let sessions = Arc::new(FakeSessions::with(Behaviour::Serve {
        html,
        sort: "absent",
    }));
    let service = QueryService::new(config(), sessions);

    let page = assert_ok!(service.run_page("laptop").await);
    assert_eq!(page.metadata.sort, SortOutcome::Absent);
    assert!(page.metadata.success);
    assert_eq!(page.document.blocks().len(), 2);
}

#[tokio::test]
async fn page_metadata_is_populated() {
    let sessions = Arc::new(FakeSessions::serving(LAPTOP_RESULTS));
    let service = QueryService::new(config(), sessions);

    let page = assert_ok!(service.run_page("laptop").await);
    assert_eq!(page.metadata.title.as_deref(), Some("laptop cheap at DuckDuckGo"));
    assert_eq!(page.metadata.sort, SortOutcome::Clicked);
    assert!(!page.metadata.from_cache);
    assert_eq!(page.metadata.stats.blocks_retained, 2);
    // header and footer links never reach the tree
    assert!(page.links.is_empty());
}

#[tokio::test]
async fn unrelated_query_is_empty_not_error() {
    let sessions = Arc::new(FakeSessions::serving(LAPTOP_RESULTS));
    let service = QueryService::new(config(), sessions);

    let doc = assert_ok!(service.run("espresso grinder").await);
    assert!(doc.is_empty());
    assert_eq!(doc.markdown(), "");
}

#[tokio::test]
async fn each_query_gets_its_own_session() {
    let sessions = Arc::new(FakeSessions::serving(LAPTOP_RESULTS));
    let service = QueryService::new(config(), sessions.clone());

    assert_ok!(service.run("laptop").await);
    assert_ok!(service.run("laptop").await);
    assert_eq!(Calls::count(&sessions.calls.acquired), 2);
    assert_eq!(Calls::count(&sessions.calls.released), 2);
}
