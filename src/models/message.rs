use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Fixed marker written over the content of soft-deleted messages. The
/// record itself is never hard-deleted.
pub const TOMBSTONE: &str = "[deleted]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
    File,
}

impl MessageKind {
    /// Label shown in conversation previews for non-text messages.
    pub fn preview_label(&self) -> &'static str {
        match self {
            MessageKind::Text => "",
            MessageKind::Image => "[image]",
            MessageKind::Audio => "[audio]",
            MessageKind::File => "[file]",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub kind: MessageKind,
    /// Text body, or a media URL for non-text kinds.
    pub content: String,
    /// Weak reference: no integrity is enforced against the target message.
    pub reply_to: Option<Uuid>,
    pub delivered_to: BTreeSet<Uuid>,
    pub read_by: BTreeSet<Uuid>,
    pub reactions: BTreeMap<String, BTreeSet<Uuid>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        conversation_id: Uuid,
        sender_id: Uuid,
        sender_name: String,
        sender_avatar: Option<String>,
        kind: MessageKind,
        content: String,
        reply_to: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        let mut seen = BTreeSet::new();
        seen.insert(sender_id);
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            sender_name,
            sender_avatar,
            kind,
            content,
            reply_to,
            delivered_to: seen.clone(),
            read_by: seen,
            reactions: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Someone besides the sender has read it. Coarse signal, not
    /// per-recipient.
    pub fn is_read(&self) -> bool {
        self.read_by.len() > 1
    }

    /// Preview text for the conversation's last-message summary: truncated
    /// body for text, a type label for everything else.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.kind {
            MessageKind::Text => self.content.chars().take(max_chars).collect(),
            other => other.preview_label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(content: &str) -> Message {
        Message::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "alice".into(),
            None,
            MessageKind::Text,
            content.into(),
            None,
        )
    }

    #[test]
    fn new_message_is_seen_only_by_sender() {
        let message = text_message("hi");
        assert_eq!(message.delivered_to.len(), 1);
        assert!(message.delivered_to.contains(&message.sender_id));
        assert!(message.read_by.contains(&message.sender_id));
        assert!(!message.is_read());
    }

    #[test]
    fn preview_truncates_long_text() {
        let message = text_message(&"x".repeat(150));
        assert_eq!(message.preview(100).chars().count(), 100);
    }

    #[test]
    fn preview_uses_label_for_media() {
        let mut message = text_message("mem://chat/pic.png");
        message.kind = MessageKind::Image;
        assert_eq!(message.preview(100), "[image]");
    }
}
