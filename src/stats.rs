//! Aggregate statistics over a loaded history.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::history::History;

/// Label used for messages without a type.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Counts and date range across every conversation, system messages included.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total_conversations: usize,
    pub total_messages: usize,
    /// Distinct sender ids.
    pub total_users: usize,
    /// Message type → count, ordered by type name.
    pub message_types: BTreeMap<String, usize>,
    pub first_message: Option<DateTime<Utc>>,
    pub last_message: Option<DateTime<Utc>>,
}

/// Compute statistics in a single pass.
pub fn compute(history: &History) -> Stats {
    let mut stats = Stats {
        total_conversations: history.conversations.len(),
        ..Stats::default()
    };
    let mut users = HashSet::new();

    for message in history.conversations.iter().flat_map(|c| &c.messages) {
        stats.total_messages += 1;
        users.insert(message.from.as_str());

        let kind = if message.message_type.is_empty() {
            UNKNOWN_TYPE
        } else {
            message.message_type.as_str()
        };
        *stats.message_types.entry(kind.to_string()).or_default() += 1;

        if let Some(ts) = message.timestamp() {
            stats.first_message = Some(stats.first_message.map_or(ts, |f| f.min(ts)));
            stats.last_message = Some(stats.last_message.map_or(ts, |l| l.max(ts)));
        }
    }

    stats.total_users = users.len();
    stats
}

/// The `n` most active senders of user messages, by sender name.
///
/// Ties are broken by name so the order is stable between runs.
pub fn top_senders(history: &History, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for message in history.conversations.iter().flat_map(|c| c.user_messages()) {
        *counts.entry(message.sender_name()).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(n);
    sorted
}
