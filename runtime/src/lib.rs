// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shopfit runtime library: query-driven shopping page extraction.
//!
//! A query becomes a provider URL, a headless browser renders it and
//! applies the ascending-price sort, and the rendered page is filtered
//! down to the blocks relevant to the query. [`service::QueryService`] is
//! the entry point; [`rest`] and [`cli`] are the two ways in.

pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod filter;
pub mod navigation;
pub mod renderer;
pub mod rest;
pub mod service;

pub use config::ServiceConfig;
pub use error::FetchError;
pub use filter::FittedDocument;
pub use service::{QueryRunner, QueryService};
