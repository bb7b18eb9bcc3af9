// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Content filtering: pruning, then query relevance.
//!
//! [`FilterPipeline::apply`] takes the page's block tree and produces a
//! [`FittedDocument`]: density pruning removes boilerplate, the survivors
//! are flattened into text blocks, and BM25 keeps only the blocks that
//! answer the query. The result renders to markdown.

pub mod bm25;
pub mod pruning;
pub mod tokenize;

use crate::extraction::dom::BlockNode;
use bm25::RelevanceFilter;
use pruning::{text_blocks, PruningFilter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the pruning threshold is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Same threshold for every element.
    Fixed,
    /// Threshold scaled per element by tag importance and density.
    #[default]
    Dynamic,
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMode::Fixed => write!(f, "fixed"),
            ThresholdMode::Dynamic => write!(f, "dynamic"),
        }
    }
}

impl std::str::FromStr for ThresholdMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(ThresholdMode::Fixed),
            "dynamic" => Ok(ThresholdMode::Dynamic),
            other => Err(format!("unknown threshold mode '{other}' (expected fixed or dynamic)")),
        }
    }
}

/// Query-independent filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterTuning {
    pub pruning_threshold: f64,
    pub threshold_mode: ThresholdMode,
    /// Elements with fewer words score -1 and are always pruned.
    pub min_word_threshold: Option<usize>,
    pub bm25_threshold: f64,
    pub k1: f64,
    pub b: f64,
    /// Upper bound on the rendered markdown size, in characters.
    pub max_fitted_chars: Option<usize>,
}

impl Default for FilterTuning {
    fn default() -> Self {
        Self {
            pruning_threshold: 0.5,
            threshold_mode: ThresholdMode::Dynamic,
            min_word_threshold: None,
            bm25_threshold: 1.2,
            k1: 1.2,
            b: 0.75,
            max_fitted_chars: Some(16_000),
        }
    }
}

/// Tuning bound to one query. Built per request and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    tuning: FilterTuning,
    query: String,
    query_terms: Vec<String>,
}

impl FilterConfig {
    pub fn new(tuning: FilterTuning, query: impl Into<String>) -> Self {
        let query = query.into();
        let query_terms = tokenize::tokenize(&query);
        Self {
            tuning,
            query,
            query_terms,
        }
    }

    pub fn tuning(&self) -> &FilterTuning {
        &self.tuning
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Tokens the relevance stage scores against. Empty when the query is
    /// only stop words or punctuation.
    pub fn query_terms(&self) -> &[String] {
        &self.query_terms
    }
}

/// One retained block in the fitted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedBlock {
    pub index: usize,
    pub tag: String,
    pub text: String,
    pub score: f64,
}

/// Filtered page content, ready to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FittedDocument {
    blocks: Vec<FittedBlock>,
    markdown: String,
}

impl FittedDocument {
    pub fn from_blocks(blocks: Vec<FittedBlock>) -> Self {
        let markdown = render_markdown(&blocks);
        Self { blocks, markdown }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn into_markdown(self) -> String {
        self.markdown
    }

    pub fn blocks(&self) -> &[FittedBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn render_markdown(blocks: &[FittedBlock]) -> String {
    blocks
        .iter()
        .map(|block| render_block(&block.tag, &block.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdown for a single block.
pub(crate) fn render_block(tag: &str, text: &str) -> String {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            format!("{} {}", "#".repeat(level), text)
        }
        "li" | "dt" | "dd" => format!("- {text}"),
        "blockquote" => format!("> {text}"),
        "pre" => format!("```\n{text}\n```"),
        _ => text.to_string(),
    }
}

/// Counters from one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub nodes_total: usize,
    pub nodes_pruned: usize,
    pub blocks_scored: usize,
    pub blocks_retained: usize,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub document: FittedDocument,
    pub stats: FilterStats,
}

/// Pruning followed by relevance, both configured from one
/// [`FilterConfig`].
pub struct FilterPipeline {
    config: FilterConfig,
    pruning: PruningFilter,
    relevance: RelevanceFilter,
}

impl FilterPipeline {
    pub fn new(config: FilterConfig) -> Self {
        let t = config.tuning();
        let pruning = PruningFilter::new(t.pruning_threshold, t.threshold_mode, t.min_word_threshold);
        let relevance =
            RelevanceFilter::new(config.query_terms(), t.bm25_threshold, t.k1, t.b, t.max_fitted_chars);
        Self {
            config,
            pruning,
            relevance,
        }
    }

    pub fn for_query(tuning: &FilterTuning, query: &str) -> Self {
        Self::new(FilterConfig::new(tuning.clone(), query))
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn apply(&self, root: BlockNode) -> FilterOutcome {
        let nodes_total = root.element_count();
        let (pruned, nodes_pruned) = self.pruning.prune(root);
        let blocks = text_blocks(&pruned);
        let blocks_scored = blocks.len();

        let retained: Vec<FittedBlock> = self
            .relevance
            .filter(blocks)
            .into_iter()
            .map(|scored| FittedBlock {
                index: scored.block.index,
                tag: scored.block.tag,
                text: scored.block.text,
                score: scored.score,
            })
            .collect();

        let stats = FilterStats {
            nodes_total,
            nodes_pruned,
            blocks_scored,
            blocks_retained: retained.len(),
        };
        tracing::debug!(
            query = %self.config.query(),
            terms = ?self.config.query_terms(),
            nodes_total,
            nodes_pruned,
            blocks_scored,
            blocks_retained = stats.blocks_retained,
            "filtered page"
        );

        FilterOutcome {
            document: FittedDocument::from_blocks(retained),
            stats,
        }
    }
}
