// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rendered page cache: in-memory, TTL plus LRU eviction.
//!
//! Only consulted when the request's [`CacheMode`](super::CacheMode) is
//! `Use`. Entries are keyed by target URL and sort script version, so a
//! changed script never serves pages rendered by the old one.

use super::RenderedPage;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    page: RenderedPage,
    cached_at: Instant,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() >= ttl
    }
}

pub struct PageCache {
    index: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl PageCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            index: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn key(url: &str, script_version: u32) -> String {
        format!("v{script_version}:{url}")
    }

    /// Fresh entry for `key`, if any.
    pub fn get(&mut self, key: &str) -> Option<RenderedPage> {
        let ttl = self.ttl;
        let entry = self.index.get_mut(key)?;
        if entry.is_expired(ttl) {
            self.index.remove(key);
            return None;
        }
        entry.last_accessed = Instant::now();
        Some(entry.page.clone())
    }

    /// Store a page. Evicts expired entries first, then the least recently
    /// used one, when at capacity.
    pub fn put(&mut self, key: &str, page: RenderedPage) {
        if self.index.len() >= self.max_entries && !self.index.contains_key(key) {
            self.evict();
        }
        let now = Instant::now();
        self.index.insert(
            key.to_string(),
            CacheEntry {
                page,
                cached_at: now,
                last_accessed: now,
            },
        );
    }

    fn evict(&mut self) {
        let ttl = self.ttl;
        let before = self.index.len();
        self.index.retain(|_, entry| !entry.is_expired(ttl));
        if self.index.len() < before {
            return;
        }

        if let Some(lru) = self
            .index
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())
        {
            tracing::debug!("evicting cached page: {lru}");
            self.index.remove(&lru);
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
