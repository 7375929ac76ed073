//! Per-query result cache
//!
//! Keys are raw query strings, matched exactly (case-sensitive). Entries are
//! replaced wholesale on every successful fetch and never evicted: the cache
//! lives as long as its controller.

use std::collections::HashMap;

use crate::paging;
use crate::SearchResult;

/// Everything fetched so far for one query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub results: Vec<SearchResult>,
    pub has_more_pages: bool,
}

impl CacheEntry {
    /// Last page reached for this entry
    pub fn page(&self, page_size: usize) -> u32 {
        paging::page_for_len(self.results.len(), page_size)
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<String, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &str) -> Option<&CacheEntry> {
        self.entries.get(query)
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    /// Replace the entry for `query`
    pub fn insert(&mut self, query: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(query.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn queries(&self) -> Vec<String> {
        let mut queries: Vec<String> = self.entries.keys().cloned().collect();
        queries.sort();
        queries
    }
}
