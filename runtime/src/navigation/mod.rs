// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Everything that decides where the browser goes and what it does there:
//! the provider URL for a query and the page-side sort interaction.

pub mod sort;
pub mod target;

pub use sort::{PageScript, SortOutcome, SortScript};
pub use target::build_target_url;
