// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the fetch pipeline.
//!
//! Every failure below the transport boundary is one of these kinds and is
//! propagated unchanged; only [`crate::rest`] turns them into status codes.

/// All failures a query can end in.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Missing or empty query. Detected before any browser work.
    #[error("invalid input: {0}")]
    Input(String),

    /// The browser engine could not be launched.
    #[error("browser session failed to start: {0}")]
    SessionStart(String),

    /// Navigation, script execution, or content collection failed.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The extraction did not finish within its time budget.
    #[error("extraction timed out after {0} ms")]
    Timeout(u64),
}

impl FetchError {
    /// HTTP status the transport boundary answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::Input(_) => 400,
            FetchError::SessionStart(_) | FetchError::Extraction(_) | FetchError::Timeout(_) => {
                500
            }
        }
    }

    /// Short machine-readable kind, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Input(_) => "input",
            FetchError::SessionStart(_) => "session_start",
            FetchError::Extraction(_) => "extraction",
            FetchError::Timeout(_) => "timeout",
        }
    }

    /// Wrap any renderer-layer error as an extraction failure, keeping the
    /// full cause chain in the message.
    pub fn extraction(err: impl std::fmt::Display) -> Self {
        FetchError::Extraction(format!("{err:#}"))
    }
}
