//! Bounded cache of finished search results, keyed by an option fingerprint.
//!
//! Lookups take a shared read lock, so concurrent searches never block each
//! other on a hit. Inserts, evictions and `clear` take the write lock for
//! the duration of the mutation only.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use tracing::debug;

use super::{SearchOptions, SearchResult};

/// Maximum number of cached result sets. Also the default.
pub const DEFAULT_CAPACITY: usize = 100;

/// Canonical cache key for a set of search options.
///
/// Every field takes part. Strings are written in quoted, escaped form so a
/// query containing the separator cannot imitate another field. Dates keep
/// sub-second precision. An empty conversation filter is the same as none.
pub fn fingerprint(options: &SearchOptions) -> String {
    let conversation = options
        .conversation_filter
        .as_deref()
        .filter(|f| !f.is_empty());
    format!(
        "q={:?}|content={}|sender={}|case={}|conv={:?}|from={:?}|to={:?}|limit={}",
        options.query,
        options.search_in_content,
        options.search_in_sender,
        options.case_sensitive,
        conversation,
        options.date_from.map(iso),
        options.date_to.map(iso),
        options.limit,
    )
}

fn iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Result sets shared between the cache and its readers.
pub type CachedResults = Arc<[SearchResult]>;

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CachedResults>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// Fingerprint → results map holding at most `capacity` entries.
///
/// When full, the oldest-inserted entries are evicted to make room.
#[derive(Debug)]
pub struct SearchCache {
    capacity: usize,
    inner: RwLock<CacheInner>,
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SearchCache {
    /// Capacities above [`DEFAULT_CAPACITY`] are clamped to it. A capacity
    /// of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.min(DEFAULT_CAPACITY),
            inner: RwLock::new(CacheInner::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedResults> {
        self.inner.read().entries.get(key).cloned()
    }

    /// Store results, evicting the oldest entries if the cache is full.
    pub fn put(&self, key: String, results: CachedResults) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.write();
        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, results);
            return;
        }

        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            debug!(key = %oldest, "Evicted cached search");
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, results);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
