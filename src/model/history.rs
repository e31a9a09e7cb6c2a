//! Root of an exported archive.

use serde::{Deserialize, Serialize};

use super::conversation::Conversation;
use super::null_as_default;
use crate::error::{Result, SkypeError};

/// The whole export: owner, export date, and every conversation.
///
/// Loaded once per run and treated as read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(rename = "userId", default, deserialize_with = "null_as_default")]
    pub user_id: String,

    #[serde(rename = "exportDate", default, deserialize_with = "null_as_default")]
    pub export_date: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub conversations: Vec<Conversation>,
}

impl History {
    /// Total messages across all conversations, system messages included.
    pub fn total_messages(&self) -> usize {
        self.conversations.iter().map(|c| c.messages.len()).sum()
    }

    /// Look up a conversation by its 1-based list number.
    pub fn conversation(&self, number: usize) -> Result<&Conversation> {
        number
            .checked_sub(1)
            .and_then(|i| self.conversations.get(i))
            .ok_or(SkypeError::ConversationOutOfRange {
                number,
                count: self.conversations.len(),
            })
    }
}
