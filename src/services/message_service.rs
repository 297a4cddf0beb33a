use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::conversation::LastMessageSummary;
use crate::models::{Message, MessageKind, TOMBSTONE};
use crate::services::ConversationService;
use crate::store::ChatStore;

/// Sole writer of message bodies. Appends to the conversation-scoped ordered
/// log and republishes the conversation's last-message summary.
pub struct MessageService {
    store: Arc<dyn ChatStore>,
    conversations: Arc<ConversationService>,
    preview_max_chars: usize,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        conversations: Arc<ConversationService>,
        preview_max_chars: usize,
    ) -> Self {
        Self {
            store,
            conversations,
            preview_max_chars,
        }
    }

    /// Appends a message and returns its id.
    ///
    /// The unread increments and summary overwrite are separate store calls
    /// after the append; a failure there is not rolled back — the message
    /// stays visible and the counters are eventually consistent.
    pub async fn append(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        kind: MessageKind,
        reply_to: Option<Uuid>,
    ) -> AppResult<Uuid> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("message content cannot be empty".into()));
        }
        let conversation = self.conversations.get(conversation_id).await?;
        if !conversation.is_participant(sender_id) {
            return Err(AppError::Validation(
                "sender is not a participant of this conversation".into(),
            ));
        }

        // Sender identity comes from the join-time snapshot.
        let (sender_name, sender_avatar) = conversation
            .participant_summaries
            .iter()
            .find(|s| s.user_id == sender_id)
            .map(|s| (s.display_name.clone(), s.avatar_url.clone()))
            .unwrap_or_else(|| (sender_id.to_string(), None));

        let message = Message::new(
            conversation_id,
            sender_id,
            sender_name,
            sender_avatar,
            kind,
            content,
            reply_to,
        );
        let message_id = message.id;
        let summary = LastMessageSummary {
            message_id,
            sender_id,
            content: message.preview(self.preview_max_chars),
            kind,
            sent_at: message.created_at,
        };

        self.store.insert_message(message).await?;
        self.conversations
            .increment_unread(conversation_id, sender_id)
            .await?;
        self.store.set_last_message(conversation_id, summary).await?;
        // Sending forces the sender's typing state back to idle.
        self.store.set_typing(conversation_id, sender_id, None).await?;

        debug!(%conversation_id, %message_id, "message appended");
        Ok(message_id)
    }

    /// The most recent `page_size` messages in ascending chronological order.
    pub async fn list(&self, conversation_id: Uuid, page_size: usize) -> AppResult<Vec<Message>> {
        let log = self.store.messages(conversation_id).await?;
        let skip = log.len().saturating_sub(page_size);
        Ok(log.into_iter().skip(skip).collect())
    }

    pub async fn get(&self, message_id: Uuid) -> AppResult<Message> {
        self.store
            .message(message_id)
            .await?
            .ok_or(AppError::NotFound("message"))
    }

    /// Overwrites the content with a tombstone; every other field survives.
    pub async fn soft_delete(&self, conversation_id: Uuid, message_id: Uuid) -> AppResult<()> {
        let message = self.get(message_id).await?;
        if message.conversation_id != conversation_id {
            return Err(AppError::NotFound("message"));
        }
        self.store.set_content(message_id, TOMBSTONE).await
    }

    /// Case-insensitive substring scan over the conversation's history.
    /// Linear on purpose: per-conversation histories are expected to stay
    /// small, and large histories would need an index-backed search instead.
    pub async fn search(&self, conversation_id: Uuid, term: &str) -> AppResult<Vec<Message>> {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return Err(AppError::Validation("search term cannot be empty".into()));
        }
        let log = self.store.messages(conversation_id).await?;
        Ok(log
            .into_iter()
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .collect())
    }
}
