//! A single chat message as stored in the export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::parser::{date, markup};

/// One message from a conversation's `MessageList`.
///
/// Field names follow the export's JSON keys. `content` is raw: it may hold
/// inline markup and HTML entities (see [`Message::display_text`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Sender display name at the time the message was sent.
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,

    /// Raw `originalarrivaltime`; parsed lazily by [`Message::timestamp`].
    #[serde(
        rename = "originalarrivaltime",
        default,
        deserialize_with = "null_as_default"
    )]
    pub timestamp: String,

    /// e.g. `RichText`, `Text`, `ThreadActivity/AddMember`, `Event/Call`.
    #[serde(rename = "messagetype", default, deserialize_with = "null_as_default")]
    pub message_type: String,

    /// Sender identifier, e.g. `8:live:alice`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,

    #[serde(
        rename = "conversationid",
        default,
        deserialize_with = "null_as_default"
    )]
    pub conversation_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub version: i64,

    #[serde(default)]
    pub properties: Option<MessageProperties>,

    /// Attachment references (media stored next to `messages.json`).
    #[serde(rename = "amsreferences", default)]
    pub ams_references: Option<Vec<String>>,
}

/// Optional per-message properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageProperties {
    #[serde(rename = "urlpreviews", default)]
    pub url_previews: Option<String>,
}

impl Message {
    /// Content with markup removed and entities decoded.
    pub fn display_text(&self) -> String {
        markup::to_display_text(&self.content)
    }

    /// Sender name: the display name if non-empty, else the raw `from` id.
    pub fn sender_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.from,
        }
    }

    /// Protocol or control-plane activity rather than user content.
    ///
    /// Matches `ThreadActivity` or `Control` anywhere in the type, so
    /// `RemoteControl/...` counts as system too.
    pub fn is_system(&self) -> bool {
        self.message_type.contains("ThreadActivity") || self.message_type.contains("Control")
    }

    /// Parsed arrival time, or `None` if the stored string is unrecognized.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        date::parse_timestamp(&self.timestamp)
    }

    /// Number of attachment references.
    pub fn attachment_count(&self) -> usize {
        self.ams_references.as_ref().map_or(0, Vec::len)
    }

    /// Whether a URL preview is attached.
    pub fn has_url_preview(&self) -> bool {
        self.properties
            .as_ref()
            .and_then(|p| p.url_previews.as_deref())
            .is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(message_type: &str) -> Message {
        Message {
            message_type: message_type.to_string(),
            ..Message::default()
        }
    }

    #[test]
    fn test_system_message_detection() {
        assert!(message("ThreadActivity/AddMember").is_system());
        assert!(message("Control/Typing").is_system());
        assert!(message("RemoteControl/Start").is_system());
        assert!(!message("RichText").is_system());
        assert!(!message("Text").is_system());
        // Case-sensitive
        assert!(!message("control").is_system());
    }

    #[test]
    fn test_sender_name_fallback() {
        let mut msg = Message {
            from: "8:live:alice".to_string(),
            ..Message::default()
        };
        assert_eq!(msg.sender_name(), "8:live:alice");
        msg.display_name = Some(String::new());
        assert_eq!(msg.sender_name(), "8:live:alice");
        msg.display_name = Some("Alice".to_string());
        assert_eq!(msg.sender_name(), "Alice");
    }

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"{
            "id": "1",
            "displayName": null,
            "content": null,
            "originalarrivaltime": "2024-01-01T10:00:00.000Z",
            "messagetype": "RichText",
            "from": "8:bob",
            "conversationid": "19:abc",
            "version": 1704103200000,
            "properties": null,
            "amsreferences": null
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content, "");
        assert_eq!(msg.sender_name(), "8:bob");
        assert!(msg.timestamp().is_some());
        assert_eq!(msg.attachment_count(), 0);
        assert!(!msg.has_url_preview());
    }

    #[test]
    fn test_display_text_and_attachments() {
        let msg = Message {
            content: "<b>Hi</b> &amp; bye".to_string(),
            ams_references: Some(vec!["a".into(), "b".into()]),
            properties: Some(MessageProperties {
                url_previews: Some("[{}]".to_string()),
            }),
            ..Message::default()
        };
        assert_eq!(msg.display_text(), "Hi & bye");
        assert_eq!(msg.attachment_count(), 2);
        assert!(msg.has_url_preview());
    }
}
