// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Turn rendered HTML into a block tree the filter pipeline can score.
//!
//! Parsing uses `scraper`. Non-content elements (scripts, navigation
//! chrome, forms) are dropped while the tree is built, and so are anchors
//! to other hosts when external links are excluded. Every element node
//! carries the size metrics the pruning stage needs, computed once here.

use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

/// Elements that never carry page content.
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "canvas", "nav", "footer",
    "header", "aside", "form", "head",
];

/// Elements that start a new text block.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "body", "caption", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "li", "main", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

/// Deepest element kept as a node. Anything nested further is folded into
/// its ancestor at this depth as plain text, which bounds every recursive
/// pass over the tree.
pub const MAX_DEPTH: usize = 256;

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// A child of an element: raw text or a nested element.
#[derive(Debug, Clone, PartialEq)]
pub enum DomChild {
    Text(String),
    Element(BlockNode),
}

/// An element with its content metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    /// Lowercase tag name.
    pub tag: String,
    /// `class` and `id` values joined by a space.
    pub class_id: String,
    pub children: Vec<DomChild>,
    /// Characters of visible text in the subtree, whitespace trimmed per
    /// text node.
    pub text_len: usize,
    /// Serialized size of the subtree's inner markup.
    pub markup_len: usize,
    /// Text characters inside anchors that are direct children.
    pub link_text_len: usize,
}

impl BlockNode {
    /// Build a node from its parts, deriving the metrics.
    pub fn new(tag: impl Into<String>, class_id: impl Into<String>, children: Vec<DomChild>) -> Self {
        let mut text_len = 0;
        let mut markup_len = 0;
        let mut link_text_len = 0;

        for child in &children {
            match child {
                DomChild::Text(text) => {
                    text_len += text.trim().chars().count();
                    markup_len += text.len();
                }
                DomChild::Element(el) => {
                    text_len += el.text_len;
                    markup_len += el.markup_len + el.tag_overhead();
                    if el.tag == "a" {
                        link_text_len += el.text_len;
                    }
                }
            }
        }

        Self {
            tag: tag.into(),
            class_id: class_id.into(),
            children,
            text_len,
            markup_len,
            link_text_len,
        }
    }

    /// Length of `<tag class="…" id="…">` plus `</tag>`.
    fn tag_overhead(&self) -> usize {
        let attrs = if self.class_id.is_empty() {
            0
        } else {
            // Approximated as a single attribute.
            self.class_id.len() + " class=\"\"".len()
        };
        2 * self.tag.len() + 5 + attrs
    }

    /// Number of whitespace-separated words in the subtree.
    pub fn word_count(&self) -> usize {
        let mut count = 0;
        self.visit_text(&mut |text| count += text.split_whitespace().count());
        count
    }

    fn visit_text(&self, f: &mut impl FnMut(&str)) {
        for child in &self.children {
            match child {
                DomChild::Text(text) => f(text),
                DomChild::Element(el) => el.visit_text(f),
            }
        }
    }

    /// Number of element nodes in the subtree, this one included.
    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| match c {
                DomChild::Element(el) => el.element_count(),
                DomChild::Text(_) => 0,
            })
            .sum::<usize>()
    }
}

/// A link kept from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub href: String,
    pub text: String,
}

/// Parsed page: content tree plus link inventory.
#[derive(Debug, Clone)]
pub struct PageTree {
    pub title: Option<String>,
    /// The `body` element (or the document root when there is none).
    pub root: BlockNode,
    /// Links to the page's own host, in document order.
    pub internal_links: Vec<PageLink>,
    /// How many external anchors were seen.
    pub external_link_count: usize,
}

struct TreeBuilder {
    base: Option<url::Url>,
    exclude_external_links: bool,
    internal_links: Vec<PageLink>,
    external_link_count: usize,
}

/// Parse `html` rendered at `base_url`.
pub fn parse_page(html: &str, base_url: &str, exclude_external_links: bool) -> PageTree {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut builder = TreeBuilder {
        base: url::Url::parse(base_url).ok(),
        exclude_external_links,
        internal_links: Vec::new(),
        external_link_count: 0,
    };
    let root = builder
        .build(body, 0)
        .unwrap_or_else(|| BlockNode::new("body", "", Vec::new()));

    PageTree {
        title,
        root,
        internal_links: builder.internal_links,
        external_link_count: builder.external_link_count,
    }
}

impl TreeBuilder {
    fn build(&mut self, element: ElementRef<'_>, depth: usize) -> Option<BlockNode> {
        let tag = element.value().name().to_ascii_lowercase();
        if EXCLUDED_TAGS.contains(&tag.as_str()) {
            return None;
        }

        if tag == "a" {
            if let Some(href) = element.value().attr("href") {
                if !self.record_link(href, element) {
                    return None;
                }
            }
        }

        let mut children = Vec::new();
        if depth >= MAX_DEPTH {
            let text = flattened_text(element);
            if !text.is_empty() {
                children.push(DomChild::Text(text));
            }
        } else {
            for child in element.children() {
                match child.value() {
                    Node::Text(text) => children.push(DomChild::Text(text.to_string())),
                    Node::Element(_) => {
                        if let Some(el) = ElementRef::wrap(child).and_then(|c| self.build(c, depth + 1)) {
                            children.push(DomChild::Element(el));
                        }
                    }
                    _ => {}
                }
            }
        }

        if tag == "br" {
            children.push(DomChild::Text("\n".to_string()));
        }

        let class_id = [element.value().attr("class"), element.value().id()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        Some(BlockNode::new(tag, class_id, children))
    }

    /// Classify an anchor. Returns false when the anchor should be dropped
    /// from the content tree.
    fn record_link(&mut self, href: &str, element: ElementRef<'_>) -> bool {
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return true;
        }

        let resolved = match &self.base {
            Some(base) => base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        };

        if is_internal(self.base.as_ref(), href, &resolved) {
            self.internal_links.push(PageLink {
                href: resolved,
                text: collapse_whitespace(&element.text().collect::<String>()),
            });
            true
        } else {
            self.external_link_count += 1;
            !self.exclude_external_links
        }
    }
}

/// Collapsed text of everything below `element`, walked iteratively.
/// Text sitting directly inside an excluded element is skipped. Links are
/// neither recorded nor filtered at this depth.
fn flattened_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };
        let excluded = node
            .parent()
            .and_then(|p| p.value().as_element())
            .is_some_and(|el| EXCLUDED_TAGS.contains(&el.name()));
        if !excluded {
            text.push(' ');
            text.push_str(chunk);
        }
    }
    collapse_whitespace(&text)
}

/// Same host as the page, ignoring a leading `www.`.
fn is_internal(base: Option<&url::Url>, href: &str, resolved: &str) -> bool {
    let base_host = base.and_then(|u| u.host_str());
    match (base_host, url::Url::parse(resolved)) {
        (Some(bh), Ok(link_url)) => link_url
            .host_str()
            .map(|h| h == bh || h.strip_prefix("www.").unwrap_or(h) == bh.strip_prefix("www.").unwrap_or(bh))
            .unwrap_or(false),
        _ => href.starts_with('/'),
    }
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
