// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! BM25 relevance scoring over text blocks.
//!
//! The corpus is the page's own blocks, so document frequencies come from
//! a few dozen short documents. Plain BM25 IDF goes negative for terms
//! that appear in most blocks, which on a results page is exactly the
//! query term. The BM25+ form used here keeps every matching term's
//! contribution positive.

use super::pruning::TextBlock;
use super::render_block;
use super::tokenize::tokenize;
use std::collections::{HashMap, HashSet};

/// Lower bound added to each matching term's saturated frequency.
const DELTA: f64 = 1.0;

/// Separator length between blocks in the rendered document.
const BLOCK_SEPARATOR_LEN: usize = 2;

/// Headings and quoted or preformatted content weigh more than body text.
fn tag_priority(tag: &str) -> f64 {
    match tag {
        "h1" => 5.0,
        "h2" => 4.0,
        "h3" => 3.0,
        "h4" => 2.5,
        "h5" => 2.0,
        "blockquote" => 2.0,
        "h6" | "pre" | "th" => 1.5,
        _ => 1.0,
    }
}

/// A block that passed the relevance cut.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBlock {
    pub block: TextBlock,
    pub score: f64,
}

pub struct RelevanceFilter {
    terms: Vec<String>,
    threshold: f64,
    k1: f64,
    b: f64,
    max_chars: Option<usize>,
}

impl RelevanceFilter {
    pub fn new(query_terms: &[String], threshold: f64, k1: f64, b: f64, max_chars: Option<usize>) -> Self {
        let mut seen = HashSet::new();
        let terms = query_terms
            .iter()
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect();
        Self {
            terms,
            threshold,
            k1,
            b,
            max_chars,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Score every block against the query. Same length as `blocks`.
    pub fn score_blocks(&self, blocks: &[TextBlock]) -> Vec<f64> {
        if self.terms.is_empty() || blocks.is_empty() {
            return vec![0.0; blocks.len()];
        }

        let docs: Vec<Vec<String>> = blocks.iter().map(|b| tokenize(&b.text)).collect();
        let n = docs.len() as f64;
        let total_len: usize = docs.iter().map(Vec::len).sum();
        let avgdl = if total_len == 0 {
            1.0
        } else {
            total_len as f64 / n
        };

        let idf: HashMap<&str, f64> = self
            .terms
            .iter()
            .map(|term| {
                let df = docs.iter().filter(|d| d.iter().any(|t| t == term)).count() as f64;
                (term.as_str(), 1.0 + ((n + 1.0) / (df + 0.5)).ln())
            })
            .collect();

        docs.iter()
            .zip(blocks)
            .map(|(doc, block)| {
                let dl = doc.len() as f64;
                let norm = self.k1 * (1.0 - self.b + self.b * dl / avgdl);
                let score: f64 = self
                    .terms
                    .iter()
                    .filter_map(|term| {
                        let tf = doc.iter().filter(|t| *t == term).count() as f64;
                        if tf == 0.0 {
                            return None;
                        }
                        let saturated = tf * (self.k1 + 1.0) / (tf + norm);
                        Some(idf[term.as_str()] * (saturated + DELTA))
                    })
                    .sum();
                score * tag_priority(&block.tag)
            })
            .collect()
    }

    /// Keep relevant blocks in document order, without duplicate text,
    /// trimmed to the size bound by dropping the weakest first.
    pub fn filter(&self, blocks: Vec<TextBlock>) -> Vec<ScoredBlock> {
        if self.terms.is_empty() {
            return Vec::new();
        }

        let scores = self.score_blocks(&blocks);
        let mut seen = HashSet::new();
        let candidates: Vec<ScoredBlock> = blocks
            .into_iter()
            .zip(scores)
            .filter(|(_, score)| *score >= self.threshold)
            .filter(|(block, _)| seen.insert(block.text.clone()))
            .map(|(block, score)| ScoredBlock { block, score })
            .collect();

        match self.max_chars {
            Some(limit) => fit_to_budget(candidates, limit),
            None => candidates,
        }
    }
}

/// Size of the block once rendered, separator included.
fn rendered_len(block: &TextBlock) -> usize {
    render_block(&block.tag, &block.text).chars().count() + BLOCK_SEPARATOR_LEN
}

/// Drop the lowest-scoring blocks until the rest fit in `limit`
/// characters. Ties go to the earlier block. Order is preserved.
fn fit_to_budget(candidates: Vec<ScoredBlock>, limit: usize) -> Vec<ScoredBlock> {
    let total: usize = candidates.iter().map(|c| rendered_len(&c.block)).sum();
    if total <= limit {
        return candidates;
    }

    let mut ranked: Vec<usize> = (0..candidates.len()).collect();
    ranked.sort_by(|&a, &b| {
        candidates[b]
            .score
            .total_cmp(&candidates[a].score)
            .then(a.cmp(&b))
    });

    let mut keep = vec![false; candidates.len()];
    let mut used = 0;
    for i in ranked {
        let len = rendered_len(&candidates[i].block);
        if used + len <= limit {
            used += len;
            keep[i] = true;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}
