// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Real Chromium against a local fixture provider.
//!
//! Run with `cargo test --test chromium_live -- --ignored` on a machine
//! with Chrome or Chromium installed.

use shopfit_runtime::navigation::SortOutcome;
use shopfit_runtime::renderer::chromium::ChromiumSessions;
use shopfit_runtime::{QueryService, ServiceConfig};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Results arrive unsorted; picking the ascending-price radio re-orders
/// them client-side.
const FIXTURE: &str = r#"<!doctype html><html><head><title>fixture shopping</title></head><body>
<div class="sort-panel">
  <label><input type="radio" name="Sort by" value="relevance" checked><div>Relevance</div></label>
  <label><input type="radio" name="Sort by" value="price_asc"><div>Price - Low To High</div></label>
</div>
<main class="results" id="results">
  <p data-price="299">Acer Aspire 3 laptop, 8GB RAM, $299</p>
  <p data-price="249">Lenovo IdeaPad laptop, 4GB RAM, $249</p>
  <p data-price="0">Sign in to save your favourite items</p>
</main>
<script>
  document.querySelectorAll('input[name="Sort by"]').forEach((input) => {
    input.addEventListener('click', () => {
      if (input.value !== 'price_asc') return;
      const main = document.getElementById('results');
      const items = Array.from(main.querySelectorAll('p[data-price]'))
        .filter((p) => p.dataset.price !== '0')
        .sort((a, b) => Number(a.dataset.price) - Number(b.dataset.price));
      items.forEach((p) => main.insertBefore(p, main.lastElementChild));
    });
  });
</script>
</body></html>"#;

#[tokio::test]
#[ignore] // Requires Chromium to be installed
async fn sorted_fixture_page_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/serp"))
        .and(query_param("q", "laptop"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FIXTURE, "text/html"))
        .mount(&server)
        .await;

    let mut config = ServiceConfig::default();
    config.provider.url_template = format!("{}/serp?q={{query}}", server.uri());
    config.extraction.settle_ms = 200;
    config.extraction.timeout_ms = 20_000;

    let sessions = Arc::new(ChromiumSessions::new(config.browser.clone()));
    let service = QueryService::new(config, sessions);

    let page = service.run_page("laptop").await.expect("live run failed");
    assert_eq!(page.metadata.sort, SortOutcome::Clicked);
    assert_eq!(
        page.document.markdown(),
        "Lenovo IdeaPad laptop, 4GB RAM, $249\n\nAcer Aspire 3 laptop, 8GB RAM, $299"
    );
}

#[tokio::test]
#[ignore] // Requires Chromium to be installed
async fn unreachable_provider_is_extraction_error() {
    let mut config = ServiceConfig::default();
    config.provider.url_template = "http://127.0.0.1:9/serp?q={query}".into();
    config.extraction.timeout_ms = 20_000;

    let sessions = Arc::new(ChromiumSessions::new(config.browser.clone()));
    let service = QueryService::new(config, sessions);

    let err = service.run_page("laptop").await.unwrap_err();
    assert_eq!(err.status_code(), 500);
}
