//! Conversations: one chat (1:1 or group) with its message list.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use super::null_as_default;

/// A conversation and its messages, in export order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub version: i64,

    #[serde(default)]
    pub properties: Option<ConversationProperties>,

    #[serde(rename = "threadProperties", default)]
    pub thread_properties: Option<ThreadProperties>,

    #[serde(rename = "MessageList", default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
}

/// Conversation-level flags from the export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationProperties {
    #[serde(rename = "conversationblocked", default)]
    pub conversation_blocked: Option<bool>,
    #[serde(rename = "lastimreceivedtime", default)]
    pub last_im_received_time: Option<String>,
    #[serde(rename = "consumptionhorizon", default)]
    pub consumption_horizon: Option<String>,
    #[serde(rename = "conversationstatus", default)]
    pub conversation_status: Option<String>,
}

/// Group-thread metadata. Absent for 1:1 chats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadProperties {
    #[serde(rename = "membercount", default)]
    pub member_count: Option<usize>,
    #[serde(default)]
    pub members: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Conversation {
    /// Name shown to the user and matched by conversation filters.
    ///
    /// Precedence: non-empty display name, then thread topic, then the raw id.
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name;
        }
        if let Some(topic) = self
            .thread_properties
            .as_ref()
            .and_then(|t| t.topic.as_deref())
        {
            return topic;
        }
        &self.id
    }

    /// Member count from thread metadata, else distinct senders seen.
    pub fn participant_count(&self) -> usize {
        if let Some(count) = self.thread_properties.as_ref().and_then(|t| t.member_count) {
            return count;
        }
        self.messages
            .iter()
            .map(|m| m.from.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Messages that are not system messages, in stored order.
    pub fn user_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_system())
    }

    /// Message count, optionally excluding system messages.
    pub fn message_count(&self, include_system: bool) -> usize {
        if include_system {
            self.messages.len()
        } else {
            self.user_messages().count()
        }
    }

    /// Latest parseable message timestamp.
    pub fn last_message_time(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().filter_map(Message::timestamp).max()
    }
}
