//! Integration tests for the search engine over a loaded export.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use skypeshell::error::SkypeError;
use skypeshell::model::conversation::Conversation;
use skypeshell::model::history::History;
use skypeshell::model::message::Message;
use skypeshell::parser::archive::load_history;
use skypeshell::search::cancel::CancellationToken;
use skypeshell::search::{MatchKind, SearchEngine, SearchOptions, SearchResult};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn history() -> History {
    load_history(&fixture("messages.json"), None).unwrap()
}

fn at(ts: &str) -> DateTime<Utc> {
    ts.parse().unwrap()
}

fn query(q: &str) -> SearchOptions {
    SearchOptions {
        query: q.to_string(),
        search_in_content: true,
        search_in_sender: true,
        ..SearchOptions::default()
    }
}

fn contents(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.message.content.as_str()).collect()
}

fn run(engine: &SearchEngine<'_>, options: &SearchOptions) -> Vec<SearchResult> {
    engine.search(options, &CancellationToken::new(), None).unwrap()
}

// ─── End-to-end scenario ────────────────────────────────────────────

#[test]
fn test_sender_query_finds_both_alice_messages() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let results = run(&engine, &query("Alice"));
    assert_eq!(contents(&results), vec!["Apple", "Cherry"]);
    assert!(results.iter().all(|r| r.kind == MatchKind::Sender));
    assert!(results.iter().all(|r| r.snippet.is_none()));
}

#[test]
fn test_date_from_narrows_to_later_message() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let options = SearchOptions {
        date_from: Some(at("2024-01-01T10:15:00Z")),
        ..query("Apple")
    };
    let results = run(&engine, &options);
    assert_eq!(contents(&results), vec!["Secret Apple"]);
    assert_eq!(results[0].conversation_name, "private");
}

#[test]
fn test_conversation_filter() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let options = SearchOptions {
        conversation_filter: Some("General".to_string()),
        ..query("Apple")
    };
    let results = run(&engine, &options);
    assert_eq!(contents(&results), vec!["Apple"]);
    assert_eq!(results[0].message.sender_name(), "Alice");

    // The filter ignores case.
    let lower = SearchOptions {
        conversation_filter: Some("general".to_string()),
        ..query("Apple")
    };
    assert_eq!(run(&engine, &lower), results);
}

#[test]
fn test_limit_takes_first_matches_in_scan_order() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let options = SearchOptions {
        query: "a".to_string(),
        search_in_content: true,
        limit: 2,
        ..SearchOptions::default()
    };
    let results = run(&engine, &options);
    assert_eq!(contents(&results), vec!["Apple", "Banana"]);
    assert_eq!(results[0].snippet.as_ref().unwrap().matched(), "A");
}

// ─── Properties ─────────────────────────────────────────────────────

#[test]
fn test_system_messages_never_match() {
    let h = history();
    let engine = SearchEngine::new(&h);
    for q in ["apple", "Apple", "remote", "addmember", "8:live"] {
        for case_sensitive in [false, true] {
            let options = SearchOptions {
                case_sensitive,
                ..query(q)
            };
            for r in run(&engine, &options) {
                assert!(!r.message.is_system(), "{q}: {:?}", r.message.message_type);
            }
        }
    }
}

#[test]
fn test_limit_is_min_of_n_and_matches() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let unlimited = run(&engine, &query("e"));
    let total = unlimited.len();
    assert!(total >= 3);

    for n in 1..=total + 2 {
        let options = SearchOptions { limit: n, ..query("e") };
        let limited = run(&engine, &options);
        assert_eq!(limited.len(), n.min(total));
        assert_eq!(limited[..], unlimited[..n.min(total)]);
    }
}

fn single_message_history(ts: &str) -> History {
    History {
        conversations: vec![Conversation {
            display_name: Some("Edge".to_string()),
            messages: vec![Message {
                content: "boundary".to_string(),
                message_type: "RichText".to_string(),
                timestamp: ts.to_string(),
                ..Message::default()
            }],
            ..Conversation::default()
        }],
        ..History::default()
    }
}

#[test]
fn test_date_bounds_are_inclusive_to_the_microsecond() {
    let h = single_message_history("2024-03-10T08:30:15.123456Z");
    let engine = SearchEngine::new(&h);
    let ts = at("2024-03-10T08:30:15.123456Z");
    let micro = Duration::microseconds(1);

    let count = |from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>| {
        let options = SearchOptions {
            date_from: from,
            date_to: to,
            ..query("boundary")
        };
        run(&engine, &options).len()
    };

    assert_eq!(count(Some(ts), None), 1);
    assert_eq!(count(None, Some(ts)), 1);
    assert_eq!(count(Some(ts), Some(ts)), 1);
    assert_eq!(count(Some(ts + micro), None), 0);
    assert_eq!(count(None, Some(ts - micro)), 0);
}

#[test]
fn test_unparseable_timestamp_fails_date_filter() {
    let h = single_message_history("not a timestamp");
    let engine = SearchEngine::new(&h);
    assert_eq!(run(&engine, &query("boundary")).len(), 1);
    let options = SearchOptions {
        date_from: Some(at("2000-01-01T00:00:00Z")),
        ..query("boundary")
    };
    assert!(run(&engine, &options).is_empty());
}

#[test]
fn test_caching_is_idempotent_and_skips_rescan() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let first = run(&engine, &query("Apple"));
    let second = run(&engine, &query("Apple"));
    assert_eq!(first, second);
    assert_eq!(engine.scan_count(), 1);
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn test_every_option_change_rescans() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let base = query("Apple");
    run(&engine, &base);

    let variants = [
        SearchOptions { query: "apple".into(), ..base.clone() },
        SearchOptions { search_in_content: false, ..base.clone() },
        SearchOptions { search_in_sender: false, ..base.clone() },
        SearchOptions { case_sensitive: true, ..base.clone() },
        SearchOptions { conversation_filter: Some("private".into()), ..base.clone() },
        SearchOptions { date_from: Some(at("2024-01-01T00:00:00Z")), ..base.clone() },
        SearchOptions { date_to: Some(at("2024-01-02T00:00:00Z")), ..base.clone() },
        SearchOptions { limit: 1, ..base.clone() },
    ];
    for (i, variant) in variants.iter().enumerate() {
        run(&engine, variant);
        assert_eq!(engine.scan_count(), i + 2, "{variant:?}");
    }
    assert_eq!(engine.cache().len(), variants.len() + 1);
}

#[test]
fn test_cancelled_search_leaves_no_trace() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let cancelled = CancellationToken::new();
    cancelled.cancel();

    let err = engine.search(&query("Apple"), &cancelled, None).unwrap_err();
    assert!(matches!(err, SkypeError::Cancelled));
    assert!(engine.cache().is_empty());

    let results = run(&engine, &query("Apple"));
    assert_eq!(contents(&results), vec!["Apple", "Secret Apple"]);
    assert_eq!(engine.scan_count(), 1);
}

#[test]
fn test_concurrent_searches_share_engine() {
    let h = history();
    let engine = SearchEngine::new(&h);
    let expected = run(&engine, &query("Apple"));
    engine.clear_cache();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| run(&engine, &query("Apple"))))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
    assert_eq!(engine.cache().len(), 1);
}
