use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Conversation, Message};

/// Server-to-client frames. Every payload is a flat JSON object carrying
/// `type`, `timestamp`, `user_id` and (where scoped) `conversation_id`
/// alongside the variant's own fields.
#[derive(Debug, Clone)]
pub enum WsOutboundEvent {
    /// Full ordered snapshot of the conversation's message log.
    MessageList { messages: Vec<Message> },
    /// Aggregate "someone else is typing" flag for the conversation.
    TypingChanged { typing: bool },
    /// Snapshot of the user's conversations, most recently updated first.
    ConversationList { conversations: Vec<Conversation> },
}

impl WsOutboundEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            WsOutboundEvent::MessageList { .. } => "message.list",
            WsOutboundEvent::TypingChanged { .. } => "typing.changed",
            WsOutboundEvent::ConversationList { .. } => "conversation.list",
        }
    }

    pub fn to_payload(&self, user_id: Uuid, conversation_id: Option<Uuid>) -> AppResult<String> {
        let mut payload = json!({
            "type": self.event_type(),
            "timestamp": Utc::now().to_rfc3339(),
            "user_id": user_id,
        });
        if let Some(id) = conversation_id {
            payload["conversation_id"] = json!(id);
        }
        let body: Value = match self {
            WsOutboundEvent::MessageList { messages } => json!({ "messages": messages }),
            WsOutboundEvent::TypingChanged { typing } => json!({ "typing": typing }),
            WsOutboundEvent::ConversationList { conversations } => {
                json!({ "conversations": conversations })
            }
        };
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), body.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::to_string(&payload)?)
    }
}
