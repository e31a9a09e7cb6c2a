//! Search engine: option set, result type, and the scanning orchestrator.
//!
//! A search is a linear, order-preserving scan over every conversation and
//! message of a loaded [`History`]. Finished result sets are cached by the
//! exact option fingerprint; cache hits skip the scan entirely.

pub mod cache;
pub mod cancel;
pub mod matcher;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{Result, SkypeError};
use crate::model::history::History;
use crate::model::message::Message;

use self::cache::{fingerprint, CachedResults, SearchCache};
use self::cancel::CancellationToken;
use self::matcher::{Matcher, Snippet, DEFAULT_CONTEXT_CHARS};

/// Everything that defines one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: String,
    pub search_in_content: bool,
    pub search_in_sender: bool,
    pub case_sensitive: bool,
    /// Case-insensitive substring of the conversation display name.
    pub conversation_filter: Option<String>,
    /// Inclusive lower bound on the message timestamp.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the message timestamp.
    pub date_to: Option<DateTime<Utc>>,
    /// Maximum results; 0 means unlimited.
    pub limit: usize,
}

impl SearchOptions {
    fn has_date_filter(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// Whether a message falls inside the date bounds.
    ///
    /// Messages whose timestamp cannot be parsed are outside any bound.
    fn accepts_date(&self, message: &Message) -> bool {
        if !self.has_date_filter() {
            return true;
        }
        let Some(ts) = message.timestamp() else {
            return false;
        };
        self.date_from.is_none_or(|from| ts >= from) && self.date_to.is_none_or(|to| ts <= to)
    }
}

/// Which field(s) matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Content,
    Sender,
    Both,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Sender => "sender",
            Self::Both => "both",
        }
    }
}

/// One matching message. Owns a copy of the message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub conversation_name: String,
    pub message: Message,
    /// Context around the content match; `None` for sender-only matches.
    pub snippet: Option<Snippet>,
    pub kind: MatchKind,
}

/// Scan progress, in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    pub scanned: usize,
    pub total: usize,
}

impl SearchProgress {
    /// Fraction scanned, in `0.0..=1.0`. An empty history counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.scanned as f64 / self.total as f64
        }
    }
}

/// Minimum time between two progress callbacks.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Samples progress so the callback fires at most every [`PROGRESS_INTERVAL`].
struct ProgressThrottle<'a> {
    callback: Option<&'a dyn Fn(SearchProgress)>,
    total: usize,
    last: Option<Instant>,
}

impl<'a> ProgressThrottle<'a> {
    fn new(callback: Option<&'a dyn Fn(SearchProgress)>, total: usize) -> Self {
        Self {
            callback,
            total,
            last: None,
        }
    }

    fn report(&mut self, scanned: usize) {
        let Some(cb) = self.callback else {
            return;
        };
        let now = Instant::now();
        if self
            .last
            .is_some_and(|last| now.duration_since(last) < PROGRESS_INTERVAL)
        {
            return;
        }
        self.last = Some(now);
        cb(SearchProgress {
            scanned,
            total: self.total,
        });
    }

    fn finish(&self, scanned: usize) {
        if let Some(cb) = self.callback {
            cb(SearchProgress {
                scanned,
                total: self.total,
            });
        }
    }
}

/// Searches one history and caches the result sets it produces.
///
/// Shareable across threads: the history is only read, and the cache
/// synchronizes itself.
#[derive(Debug)]
pub struct SearchEngine<'h> {
    history: &'h History,
    cache: SearchCache,
    context_chars: usize,
    scans: AtomicUsize,
}

impl<'h> SearchEngine<'h> {
    /// Engine with the default cache size and snippet context.
    pub fn new(history: &'h History) -> Self {
        Self {
            history,
            cache: SearchCache::default(),
            context_chars: DEFAULT_CONTEXT_CHARS,
            scans: AtomicUsize::new(0),
        }
    }

    /// Engine sized from the `[search]` configuration section.
    pub fn with_config(history: &'h History, config: &SearchConfig) -> Self {
        Self {
            history,
            cache: SearchCache::new(config.cache_capacity),
            context_chars: config.context_chars,
            scans: AtomicUsize::new(0),
        }
    }

    /// Run a search.
    ///
    /// Cached results are returned as-is, even if `cancel` is already set.
    /// Otherwise the scan polls `cancel` before every conversation and every
    /// message and fails with [`SkypeError::Cancelled`] without caching
    /// anything. `progress` is sampled at most ten times per second, plus
    /// once when the scan completes.
    pub fn search(
        &self,
        options: &SearchOptions,
        cancel: &CancellationToken,
        progress: Option<&dyn Fn(SearchProgress)>,
    ) -> Result<Vec<SearchResult>> {
        let key = fingerprint(options);
        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, results = cached.len(), "Search cache hit");
            return Ok(cached.to_vec());
        }

        if cancel.is_cancelled() {
            debug!("Search cancelled before scan");
            return Err(SkypeError::Cancelled);
        }

        debug!(key = %key, "Search cache miss, scanning");
        let results = self.scan(options, cancel, progress)?;

        let results: CachedResults = results.into();
        self.cache.put(key, Arc::clone(&results));
        Ok(results.to_vec())
    }

    /// Discard all cached result sets.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of full scans performed (cache misses that ran).
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    pub fn history(&self) -> &'h History {
        self.history
    }

    fn scan(
        &self,
        options: &SearchOptions,
        cancel: &CancellationToken,
        progress: Option<&dyn Fn(SearchProgress)>,
    ) -> Result<Vec<SearchResult>> {
        self.scans.fetch_add(1, Ordering::Relaxed);

        let matcher = Matcher::new(options, self.context_chars);
        let conversation_filter = options
            .conversation_filter
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        let mut throttle = ProgressThrottle::new(progress, self.history.total_messages());
        let mut scanned = 0usize;
        let mut results = Vec::new();

        'conversations: for conversation in &self.history.conversations {
            if cancel.is_cancelled() {
                debug!(scanned, "Search cancelled");
                return Err(SkypeError::Cancelled);
            }

            let name = conversation.display_name();
            if let Some(filter) = &conversation_filter {
                if !name.to_lowercase().contains(filter.as_str()) {
                    scanned += conversation.messages.len();
                    throttle.report(scanned);
                    continue;
                }
            }

            for message in &conversation.messages {
                if cancel.is_cancelled() {
                    debug!(scanned, "Search cancelled");
                    return Err(SkypeError::Cancelled);
                }
                scanned += 1;
                throttle.report(scanned);

                if message.is_system() || !options.accepts_date(message) {
                    continue;
                }

                if let Some(outcome) = matcher.check(message) {
                    results.push(SearchResult {
                        conversation_name: name.to_string(),
                        message: message.clone(),
                        kind: outcome.kind(),
                        snippet: outcome.snippet,
                    });

                    if options.limit > 0 && results.len() >= options.limit {
                        debug!(limit = options.limit, scanned, "Result limit reached");
                        break 'conversations;
                    }
                }
            }
        }

        throttle.finish(scanned);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::conversation::Conversation;
    use std::cell::{Cell, RefCell};

    fn msg(from: &str, content: &str, ts: &str) -> Message {
        Message {
            from: from.to_string(),
            content: content.to_string(),
            timestamp: ts.to_string(),
            message_type: "RichText".to_string(),
            ..Message::default()
        }
    }

    fn history() -> History {
        History {
            conversations: vec![
                Conversation {
                    id: "19:one".to_string(),
                    display_name: Some("Team".to_string()),
                    messages: vec![
                        msg("ann", "test message 1", "2024-01-01T10:00:00Z"),
                        msg("ben", "test message 2", "2024-01-01T10:01:00Z"),
                        msg("ann", "another one", "2024-01-01T10:02:00Z"),
                    ],
                    ..Conversation::default()
                },
            ],
            ..History::default()
        }
    }

    fn content_query(query: &str) -> SearchOptions {
        SearchOptions {
            query: query.to_string(),
            search_in_content: true,
            ..SearchOptions::default()
        }
    }

    #[test]
    fn test_basic_search() {
        let h = history();
        let engine = SearchEngine::new(&h);
        let results = engine
            .search(&content_query("test"), &CancellationToken::new(), None)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].conversation_name, "Team");
        assert_eq!(results[0].kind, MatchKind::Content);
        assert_eq!(results[0].message.content, "test message 1");
    }

    #[test]
    fn test_cached_search_does_not_rescan() {
        let h = history();
        let engine = SearchEngine::new(&h);
        let token = CancellationToken::new();
        let first = engine.search(&content_query("test"), &token, None).unwrap();
        let second = engine.search(&content_query("test"), &token, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.scan_count(), 1);

        engine.clear_cache();
        engine.search(&content_query("test"), &token, None).unwrap();
        assert_eq!(engine.scan_count(), 2);
    }

    #[test]
    fn test_cancelled_before_scan_caches_nothing() {
        let h = history();
        let engine = SearchEngine::new(&h);
        let token = CancellationToken::new();
        token.cancel();

        let err = engine.search(&content_query("test"), &token, None).unwrap_err();
        assert!(matches!(err, SkypeError::Cancelled));
        assert!(engine.cache().is_empty());
        assert_eq!(engine.scan_count(), 0);

        let results = engine
            .search(&content_query("test"), &CancellationToken::new(), None)
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_cache_hit_ignores_cancellation() {
        let h = history();
        let engine = SearchEngine::new(&h);
        engine
            .search(&content_query("test"), &CancellationToken::new(), None)
            .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let cached = engine.search(&content_query("test"), &token, None).unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn test_cancelled_mid_scan_discards_partial_results() {
        let h = history();
        let engine = SearchEngine::new(&h);
        let token = CancellationToken::new();
        let calls = RefCell::new(0);
        let cancel_on_first = |_: SearchProgress| {
            *calls.borrow_mut() += 1;
            token.cancel();
        };

        let err = engine
            .search(&content_query("test"), &token, Some(&cancel_on_first))
            .unwrap_err();
        assert!(matches!(err, SkypeError::Cancelled));
        assert_eq!(*calls.borrow(), 1);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_progress_reports_completion() {
        let h = history();
        let engine = SearchEngine::new(&h);
        let last = RefCell::new(None);
        let record = |p: SearchProgress| *last.borrow_mut() = Some(p);
        engine
            .search(&content_query("zzz"), &CancellationToken::new(), Some(&record))
            .unwrap();
        let last = last.borrow().unwrap();
        assert_eq!(last.scanned, 3);
        assert_eq!(last.total, 3);
        assert_eq!(last.fraction(), 1.0);
    }

    #[test]
    fn test_no_matches_is_ok() {
        let h = history();
        let engine = SearchEngine::new(&h);
        let results = engine
            .search(&content_query("cache-test"), &CancellationToken::new(), None)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_empty_history() {
        let h = History::default();
        let engine = SearchEngine::new(&h);
        let results = engine
            .search(&content_query("a"), &CancellationToken::new(), None)
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(SearchProgress { scanned: 0, total: 0 }.fraction(), 1.0);
    }

    #[test]
    fn test_with_config_uses_context_and_capacity() {
        let h = history();
        let config = SearchConfig {
            context_chars: 2,
            cache_capacity: 0,
            ..SearchConfig::default()
        };
        let engine = SearchEngine::with_config(&h, &config);
        let results = engine
            .search(&content_query("message"), &CancellationToken::new(), None)
            .unwrap();
        assert_eq!(results[0].snippet.as_ref().unwrap().text, "…t message 1");
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_config_cannot_raise_cache_above_maximum() {
        let h = history();
        let config = SearchConfig {
            cache_capacity: 500,
            ..SearchConfig::default()
        };
        let engine = SearchEngine::with_config(&h, &config);
        let token = CancellationToken::new();
        for limit in 1..=300 {
            let options = SearchOptions {
                limit,
                ..content_query("test")
            };
            engine.search(&options, &token, None).unwrap();
        }
        assert_eq!(engine.scan_count(), 300);
        assert_eq!(engine.cache().len(), cache::DEFAULT_CAPACITY);
    }

    #[test]
    fn test_entity_encoded_content_is_searchable() {
        let h = History {
            conversations: vec![Conversation {
                display_name: Some("Lunch".to_string()),
                messages: vec![msg(
                    "ann",
                    "caf&eacute; &hearts; fish &amp chips",
                    "2024-01-01T12:00:00Z",
                )],
                ..Conversation::default()
            }],
            ..History::default()
        };
        let engine = SearchEngine::new(&h);
        let token = CancellationToken::new();
        for q in ["café", "♥", "fish & chips"] {
            let results = engine.search(&content_query(q), &token, None).unwrap();
            assert_eq!(results.len(), 1, "{q}");
        }
    }

    fn large_history(count: usize) -> History {
        let messages = (0..count)
            .map(|i| msg("ann", &format!("message number {i}"), "2024-01-01T10:00:00Z"))
            .collect();
        History {
            conversations: vec![Conversation {
                display_name: Some("Busy".to_string()),
                messages,
                ..Conversation::default()
            }],
            ..History::default()
        }
    }

    #[test]
    fn test_progress_is_throttled() {
        const COUNT: usize = 5_000;
        let h = large_history(COUNT);
        let engine = SearchEngine::new(&h);
        let calls = Cell::new(0usize);
        let count = |_: SearchProgress| calls.set(calls.get() + 1);

        let started = Instant::now();
        engine
            .search(&content_query("zzz"), &CancellationToken::new(), Some(&count))
            .unwrap();
        let elapsed = started.elapsed();

        // One report per started interval, plus the final one.
        let intervals = (elapsed.as_millis() / PROGRESS_INTERVAL.as_millis()) as usize + 1;
        assert!(calls.get() >= 2);
        assert!(calls.get() <= intervals + 1, "{} calls in {elapsed:?}", calls.get());
        assert!(calls.get() < COUNT / 10);
    }

    #[test]
    fn test_throttle_drops_reports_within_interval() {
        let calls = Cell::new(0usize);
        let count = |_: SearchProgress| calls.set(calls.get() + 1);
        let mut throttle = ProgressThrottle::new(Some(&count), 1_000);

        let started = Instant::now();
        for scanned in 0..1_000 {
            throttle.report(scanned);
        }
        let elapsed = started.elapsed();
        let intervals = (elapsed.as_millis() / PROGRESS_INTERVAL.as_millis()) as usize + 1;
        assert!(calls.get() >= 1);
        assert!(calls.get() <= intervals, "{} calls in {elapsed:?}", calls.get());

        throttle.finish(1_000);
        assert!(calls.get() <= intervals + 1);
    }
}
