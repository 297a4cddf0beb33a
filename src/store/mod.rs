pub mod blob;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Conversation, LastMessageSummary, Message};

pub use blob::{BlobStore, MemoryBlobStore};
pub use memory::MemoryStore;

/// Change notification emitted after every committed write. Subscribers
/// re-read the store on receipt, so a lagged receiver only loses
/// intermediate states, never the final one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    ConversationChanged { conversation_id: Uuid },
    MessagesChanged { conversation_id: Uuid },
}

/// Typed document-store boundary for the chat core.
///
/// The increment and set union/remove operations are atomic per field/key so
/// the unread and reaction maps can be mutated from independent call paths
/// without read-modify-write races over the whole map. Implementations are
/// injected into the services, which keeps test doubles trivial.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert if absent. Returns false when a conversation with this id
    /// already exists; the existing record is left untouched.
    async fn insert_conversation(&self, conversation: Conversation) -> AppResult<bool>;

    async fn conversation(&self, id: Uuid) -> AppResult<Option<Conversation>>;

    /// Conversations containing the user, ordered by `updated_at` descending.
    async fn conversations_for_user(&self, user_id: Uuid) -> AppResult<Vec<Conversation>>;

    /// Atomically adds `delta` to the unread counter of every participant
    /// except `exclude`.
    async fn increment_unread(
        &self,
        conversation_id: Uuid,
        exclude: Uuid,
        delta: u32,
    ) -> AppResult<()>;

    async fn reset_unread(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Overwrites the denormalized last-message summary and bumps
    /// `updated_at`.
    async fn set_last_message(
        &self,
        conversation_id: Uuid,
        summary: LastMessageSummary,
    ) -> AppResult<()>;

    /// `signaled_at = None` removes the typing entry.
    async fn set_typing(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        signaled_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Removes typing entries signaled before `older_than` across all
    /// conversations. Returns the number of entries removed.
    async fn clear_stale_typing(&self, older_than: DateTime<Utc>) -> AppResult<usize>;

    async fn insert_message(&self, message: Message) -> AppResult<()>;

    async fn message(&self, id: Uuid) -> AppResult<Option<Message>>;

    /// All messages of the conversation, ordered by `created_at` with ties
    /// broken by message id.
    async fn messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>>;

    async fn set_content(&self, message_id: Uuid, content: &str) -> AppResult<()>;

    /// Idempotent set-union into `delivered_to`.
    async fn add_delivered(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Idempotent set-union into `read_by`.
    async fn add_read(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Atomic per-key union into `reactions[emoji]`.
    async fn add_reaction(&self, message_id: Uuid, emoji: &str, user_id: Uuid) -> AppResult<()>;

    /// Atomic per-key removal; drops the emoji key once its set empties.
    async fn remove_reaction(&self, message_id: Uuid, emoji: &str, user_id: Uuid)
        -> AppResult<()>;

    /// Change feed. A subscriber receives every event published after it
    /// subscribed, subject to lag.
    fn events(&self) -> broadcast::Receiver<StoreEvent>;
}
