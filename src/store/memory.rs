use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Conversation, LastMessageSummary, Message};

use super::{ChatStore, StoreEvent};

/// In-memory `ChatStore`. Holding the write lock for the duration of each
/// mutation gives the per-field and per-key atomicity the trait requires.
pub struct MemoryStore {
    conversations: RwLock<HashMap<Uuid, Conversation>>,
    /// Messages in append order, keyed by owning conversation.
    messages: RwLock<HashMap<Uuid, Vec<Message>>>,
    /// message id -> owning conversation id.
    index: RwLock<HashMap<Uuid, Uuid>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            conversations: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn notify(&self, event: StoreEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    /// Runs `mutate` on the message under the write lock, stamps
    /// `updated_at`, and publishes a change event.
    async fn with_message<F>(&self, message_id: Uuid, mutate: F) -> AppResult<()>
    where
        F: FnOnce(&mut Message) + Send,
    {
        let conversation_id = {
            let index = self.index.read().await;
            *index.get(&message_id).ok_or(AppError::NotFound("message"))?
        };
        {
            let mut messages = self.messages.write().await;
            let log = messages
                .get_mut(&conversation_id)
                .ok_or(AppError::NotFound("message"))?;
            let message = log
                .iter_mut()
                .find(|m| m.id == message_id)
                .ok_or(AppError::NotFound("message"))?;
            mutate(message);
            message.updated_at = Utc::now();
        }
        self.notify(StoreEvent::MessagesChanged { conversation_id });
        Ok(())
    }

    /// Runs `mutate` on the conversation under the write lock. `updated_at`
    /// only moves when `bump_updated` is set; typing signals and unread
    /// resets must not reorder conversation lists.
    async fn with_conversation<F>(
        &self,
        conversation_id: Uuid,
        bump_updated: bool,
        mutate: F,
    ) -> AppResult<()>
    where
        F: FnOnce(&mut Conversation) + Send,
    {
        {
            let mut conversations = self.conversations.write().await;
            let conversation = conversations
                .get_mut(&conversation_id)
                .ok_or(AppError::NotFound("conversation"))?;
            mutate(conversation);
            if bump_updated {
                conversation.updated_at = Utc::now();
            }
        }
        self.notify(StoreEvent::ConversationChanged { conversation_id });
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert_conversation(&self, conversation: Conversation) -> AppResult<bool> {
        let id = conversation.id;
        let inserted = {
            let mut conversations = self.conversations.write().await;
            match conversations.entry(id) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(conversation);
                    true
                }
            }
        };
        if inserted {
            self.messages.write().await.entry(id).or_default();
            self.notify(StoreEvent::ConversationChanged {
                conversation_id: id,
            });
        }
        Ok(inserted)
    }

    async fn conversation(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        Ok(self.conversations.read().await.get(&id).cloned())
    }

    async fn conversations_for_user(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let conversations = self.conversations.read().await;
        let mut list: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.is_participant(user_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(list)
    }

    async fn increment_unread(
        &self,
        conversation_id: Uuid,
        exclude: Uuid,
        delta: u32,
    ) -> AppResult<()> {
        self.with_conversation(conversation_id, false, |conversation| {
            let participants = conversation.participants.clone();
            for user in participants {
                if user != exclude {
                    *conversation.unread.entry(user).or_insert(0) += delta;
                }
            }
        })
        .await
    }

    async fn reset_unread(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.with_conversation(conversation_id, false, |conversation| {
            conversation.unread.insert(user_id, 0);
        })
        .await
    }

    async fn set_last_message(
        &self,
        conversation_id: Uuid,
        summary: LastMessageSummary,
    ) -> AppResult<()> {
        self.with_conversation(conversation_id, true, |conversation| {
            conversation.last_message = Some(summary);
        })
        .await
    }

    async fn set_typing(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        signaled_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.with_conversation(conversation_id, false, |conversation| match signaled_at {
            Some(at) => {
                conversation.typing.insert(user_id, at);
            }
            None => {
                conversation.typing.remove(&user_id);
            }
        })
        .await
    }

    async fn clear_stale_typing(&self, older_than: DateTime<Utc>) -> AppResult<usize> {
        let mut removed = 0;
        let mut touched = Vec::new();
        {
            let mut conversations = self.conversations.write().await;
            for (id, conversation) in conversations.iter_mut() {
                let before = conversation.typing.len();
                conversation.typing.retain(|_, at| *at >= older_than);
                if conversation.typing.len() != before {
                    removed += before - conversation.typing.len();
                    touched.push(*id);
                }
            }
        }
        for conversation_id in touched {
            self.notify(StoreEvent::ConversationChanged { conversation_id });
        }
        Ok(removed)
    }

    async fn insert_message(&self, message: Message) -> AppResult<()> {
        let conversation_id = message.conversation_id;
        if !self
            .conversations
            .read()
            .await
            .contains_key(&conversation_id)
        {
            return Err(AppError::NotFound("conversation"));
        }
        self.index.write().await.insert(message.id, conversation_id);
        self.messages
            .write()
            .await
            .entry(conversation_id)
            .or_default()
            .push(message);
        self.notify(StoreEvent::MessagesChanged { conversation_id });
        Ok(())
    }

    async fn message(&self, id: Uuid) -> AppResult<Option<Message>> {
        let conversation_id = match self.index.read().await.get(&id).copied() {
            Some(conversation_id) => conversation_id,
            None => return Ok(None),
        };
        let messages = self.messages.read().await;
        Ok(messages
            .get(&conversation_id)
            .and_then(|log| log.iter().find(|m| m.id == id).cloned()))
    }

    async fn messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut log = messages
            .get(&conversation_id)
            .ok_or(AppError::NotFound("conversation"))?
            .clone();
        log.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(log)
    }

    async fn set_content(&self, message_id: Uuid, content: &str) -> AppResult<()> {
        let content = content.to_owned();
        self.with_message(message_id, move |message| {
            message.content = content;
        })
        .await
    }

    async fn add_delivered(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.with_message(message_id, move |message| {
            message.delivered_to.insert(user_id);
        })
        .await
    }

    async fn add_read(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.with_message(message_id, move |message| {
            message.read_by.insert(user_id);
        })
        .await
    }

    async fn add_reaction(&self, message_id: Uuid, emoji: &str, user_id: Uuid) -> AppResult<()> {
        let emoji = emoji.to_owned();
        self.with_message(message_id, move |message| {
            message.reactions.entry(emoji).or_default().insert(user_id);
        })
        .await
    }

    async fn remove_reaction(
        &self,
        message_id: Uuid,
        emoji: &str,
        user_id: Uuid,
    ) -> AppResult<()> {
        let emoji = emoji.to_owned();
        self.with_message(message_id, move |message| {
            let emptied = match message.reactions.get_mut(&emoji) {
                Some(set) => {
                    set.remove(&user_id);
                    set.is_empty()
                }
                None => false,
            };
            if emptied {
                message.reactions.remove(&emoji);
            }
        })
        .await
    }

    fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationKind, MessageKind};
    use std::collections::HashMap;

    fn conversation(participants: Vec<Uuid>) -> Conversation {
        let now = Utc::now();
        Conversation {
            id: Uuid::new_v4(),
            kind: ConversationKind::Group,
            unread: participants.iter().map(|id| (*id, 0)).collect(),
            participants,
            participant_summaries: Vec::new(),
            typing: HashMap::new(),
            last_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn message_in(conversation_id: Uuid, sender_id: Uuid) -> Message {
        Message::new(
            conversation_id,
            sender_id,
            "sender".into(),
            None,
            MessageKind::Text,
            "hello".into(),
            None,
        )
    }

    #[tokio::test]
    async fn insert_conversation_is_first_writer_wins() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let existing = conversation(vec![a]);
        let id = existing.id;
        assert!(store.insert_conversation(existing.clone()).await.unwrap());

        let mut second = conversation(vec![a]);
        second.id = id;
        assert!(!store.insert_conversation(second).await.unwrap());
        assert_eq!(store.conversation(id).await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn messages_order_breaks_timestamp_ties_by_id() {
        let store = MemoryStore::new();
        let sender = Uuid::new_v4();
        let conv = conversation(vec![sender]);
        let conversation_id = conv.id;
        store.insert_conversation(conv).await.unwrap();

        let stamp = Utc::now();
        let mut first = message_in(conversation_id, sender);
        let mut second = message_in(conversation_id, sender);
        first.created_at = stamp;
        second.created_at = stamp;
        // Insert in reverse id order to prove the sort is doing the work.
        let (lo, hi) = if first.id < second.id {
            (first.id, second.id)
        } else {
            (second.id, first.id)
        };
        store.insert_message(second).await.unwrap();
        store.insert_message(first).await.unwrap();

        let log = store.messages(conversation_id).await.unwrap();
        assert_eq!(log[0].id, lo);
        assert_eq!(log[1].id, hi);
    }

    #[tokio::test]
    async fn increment_unread_skips_excluded_sender() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conv = conversation(vec![a, b]);
        let id = conv.id;
        store.insert_conversation(conv).await.unwrap();

        store.increment_unread(id, a, 1).await.unwrap();
        let conv = store.conversation(id).await.unwrap().unwrap();
        assert_eq!(conv.unread[&a], 0);
        assert_eq!(conv.unread[&b], 1);
    }

    #[tokio::test]
    async fn remove_reaction_drops_empty_emoji_key() {
        let store = MemoryStore::new();
        let sender = Uuid::new_v4();
        let conv = conversation(vec![sender]);
        let conversation_id = conv.id;
        store.insert_conversation(conv).await.unwrap();
        let message = message_in(conversation_id, sender);
        let message_id = message.id;
        store.insert_message(message).await.unwrap();

        store.add_reaction(message_id, "❤️", sender).await.unwrap();
        store
            .remove_reaction(message_id, "❤️", sender)
            .await
            .unwrap();

        let message = store.message(message_id).await.unwrap().unwrap();
        assert!(message.reactions.is_empty());
    }

    #[tokio::test]
    async fn clear_stale_typing_removes_old_entries() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let conv = conversation(vec![a]);
        let id = conv.id;
        store.insert_conversation(conv).await.unwrap();

        let stale = Utc::now() - chrono::Duration::seconds(10);
        store.set_typing(id, a, Some(stale)).await.unwrap();
        let removed = store
            .clear_stale_typing(Utc::now() - chrono::Duration::seconds(5))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let conv = store.conversation(id).await.unwrap().unwrap();
        assert!(conv.typing.is_empty());
    }
}
