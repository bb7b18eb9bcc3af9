// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider URL construction.

use url::Url;

/// Placeholder the query is substituted into.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// The fixed search provider, biased toward its shopping view.
pub const DEFAULT_PROVIDER_TEMPLATE: &str =
    "https://duckduckgo.com/?q={query}+cheap&iax=shopping&ia=shopping";

/// Embed `query` into `template`.
///
/// The query is form-urlencoded, so spaces become `+` and reserved
/// characters cannot break out of the `q` parameter. The result depends
/// only on its inputs.
pub fn build_target_url(template: &str, query: &str) -> Result<Url, url::ParseError> {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    Url::parse(&template.replace(QUERY_PLACEHOLDER, &encoded))
}
