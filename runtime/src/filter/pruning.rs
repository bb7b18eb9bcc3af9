// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Density-based pruning.
//!
//! Each element is scored from its own shape: how much of its markup is
//! text, how much of its text is link text, what kind of tag it is, what
//! its class/id hint at, and how long it is. Elements under the threshold
//! are removed with everything below them; survivors are descended into.
//! The root is a container and is never scored.
//!
//! In dynamic mode the threshold is scaled per element by factors that do
//! not depend on the threshold itself, so raising the threshold can only
//! remove more.

use super::ThresholdMode;
use crate::extraction::dom::{collapse_whitespace, is_block_tag, BlockNode, DomChild};
use regex::Regex;
use serde::{Deserialize, Serialize};

const W_TEXT_DENSITY: f64 = 0.4;
const W_LINK_DENSITY: f64 = 0.2;
const W_TAG: f64 = 0.2;
const W_CLASS_ID: f64 = 0.1;
const W_TEXT_LENGTH: f64 = 0.1;

/// Prior on how much content a tag usually carries.
fn tag_weight(tag: &str) -> f64 {
    match tag {
        "article" => 1.5,
        "main" => 1.4,
        "h1" => 1.2,
        "h2" => 1.1,
        "p" | "section" | "h3" | "blockquote" | "pre" => 1.0,
        "h4" => 0.9,
        "h5" => 0.8,
        "h6" => 0.7,
        "td" | "th" | "table" | "dd" => 0.6,
        "li" | "ul" | "ol" | "div" => 0.5,
        "span" => 0.3,
        _ => 0.5,
    }
}

/// Importance used by dynamic thresholds; above 1.0 lowers the bar.
fn tag_importance(tag: &str) -> f64 {
    match tag {
        "article" => 1.5,
        "main" | "h1" => 1.4,
        "section" | "h2" => 1.3,
        "p" | "h3" => 1.2,
        "li" | "td" => 1.1,
        "span" => 0.6,
        _ => 0.7,
    }
}

/// A flattened run of text from one block-level element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Position in document order.
    pub index: usize,
    pub tag: String,
    pub text: String,
}

pub struct PruningFilter {
    threshold: f64,
    mode: ThresholdMode,
    min_word_threshold: Option<usize>,
    negative: Option<Regex>,
    positive: Option<Regex>,
}

impl PruningFilter {
    pub fn new(threshold: f64, mode: ThresholdMode, min_word_threshold: Option<usize>) -> Self {
        Self {
            threshold,
            mode,
            min_word_threshold,
            negative: Regex::new(
                r"(?i)\b(nav|navbar|menu|footer|header|sidebar|ads?|advert\w*|sponsor\w*|comments?|promo\w*|social|share|cookie\w*|banner|popup|modal|breadcrumbs?)\b",
            )
            .ok(),
            positive: Regex::new(
                r"(?i)\b(content|article|main|body|post|text|product\w*|results?|price|item|offer|listing|tile)\b",
            )
            .ok(),
        }
    }

    /// Composite content score for one element.
    pub fn score(&self, node: &BlockNode) -> f64 {
        if let Some(min) = self.min_word_threshold {
            if node.word_count() < min {
                return -1.0;
            }
        }

        let text_len = node.text_len as f64;
        let text_density = if node.markup_len > 0 {
            text_len / node.markup_len as f64
        } else {
            0.0
        };
        let link_density = 1.0 - link_ratio_or(node, 0.0);

        W_TEXT_DENSITY * text_density
            + W_LINK_DENSITY * link_density
            + W_TAG * tag_weight(&node.tag)
            + W_CLASS_ID * self.class_id_score(&node.class_id)
            + W_TEXT_LENGTH * (text_len + 1.0).ln()
    }

    /// Threshold the element has to reach.
    pub fn effective_threshold(&self, node: &BlockNode) -> f64 {
        match self.mode {
            ThresholdMode::Fixed => self.threshold,
            ThresholdMode::Dynamic => {
                let mut threshold = self.threshold;
                if tag_importance(&node.tag) > 1.0 {
                    threshold *= 0.8;
                }
                let text_ratio = if node.markup_len > 0 {
                    node.text_len as f64 / node.markup_len as f64
                } else {
                    0.0
                };
                if text_ratio > 0.4 {
                    threshold *= 0.9;
                }
                if link_ratio_or(node, 1.0) > 0.6 {
                    threshold *= 1.2;
                }
                threshold
            }
        }
    }

    pub fn retains(&self, node: &BlockNode) -> bool {
        self.score(node) >= self.effective_threshold(node)
    }

    /// Prune below `root`. Returns the pruned tree and the number of
    /// element nodes removed.
    pub fn prune(&self, mut root: BlockNode) -> (BlockNode, usize) {
        let mut removed = 0;
        self.prune_children(&mut root, &mut removed);
        (root, removed)
    }

    fn prune_children(&self, node: &mut BlockNode, removed: &mut usize) {
        node.children.retain_mut(|child| match child {
            DomChild::Text(_) => true,
            DomChild::Element(el) => {
                if self.retains(el) {
                    self.prune_children(el, removed);
                    true
                } else {
                    *removed += el.element_count();
                    false
                }
            }
        });
    }

    fn class_id_score(&self, class_id: &str) -> f64 {
        if class_id.is_empty() {
            return 0.0;
        }
        let mut score = 0.0;
        if self.negative.as_ref().is_some_and(|re| re.is_match(class_id)) {
            score -= 0.5;
        }
        if self.positive.as_ref().is_some_and(|re| re.is_match(class_id)) {
            score += 0.5;
        }
        score
    }
}

/// Share of the element's text that sits in direct-child links, or
/// `empty` when it has no text.
fn link_ratio_or(node: &BlockNode, empty: f64) -> f64 {
    if node.text_len > 0 {
        node.link_text_len as f64 / node.text_len as f64
    } else {
        empty
    }
}

/// Flatten a (pruned) tree into text blocks in document order.
///
/// A block is a block-level element's own text: its text nodes plus the
/// text of inline descendants. Nested block elements become blocks of
/// their own.
pub fn text_blocks(root: &BlockNode) -> Vec<TextBlock> {
    let mut out = Vec::new();
    collect_block(root, &mut out);
    out
}

fn collect_block(node: &BlockNode, out: &mut Vec<TextBlock>) {
    let mut own = String::new();
    gather_inline(node, &mut own);

    let text = if node.tag == "pre" {
        own.trim_matches('\n').to_string()
    } else {
        collapse_whitespace(&own)
    };
    if !text.trim().is_empty() {
        out.push(TextBlock {
            index: out.len(),
            tag: node.tag.clone(),
            text,
        });
    }

    visit_nested_blocks(node, out);
}

fn gather_inline(node: &BlockNode, buf: &mut String) {
    for child in &node.children {
        match child {
            DomChild::Text(text) => buf.push_str(text),
            DomChild::Element(el) if is_block_tag(&el.tag) => buf.push(' '),
            DomChild::Element(el) => gather_inline(el, buf),
        }
    }
}

fn visit_nested_blocks(node: &BlockNode, out: &mut Vec<TextBlock>) {
    for child in &node.children {
        if let DomChild::Element(el) = child {
            if is_block_tag(&el.tag) {
                collect_block(el, out);
            } else {
                visit_nested_blocks(el, out);
            }
        }
    }
}
