use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::ChatStore;

/// Derived read-receipt state for one message.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptState {
    pub message_id: Uuid,
    pub delivered_to: BTreeSet<Uuid>,
    pub read_by: BTreeSet<Uuid>,
    /// Someone besides the sender has read it.
    pub is_read: bool,
    /// Every participant except the sender has read it.
    pub seen_by_all: bool,
}

/// Sole writer of the per-message delivered/read sets. All marks are
/// idempotent set unions; a failed mark is simply retried by the next
/// delivery or read event and never blocks message visibility.
pub struct ReceiptService {
    store: Arc<dyn ChatStore>,
}

impl ReceiptService {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    pub async fn mark_delivered(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.store.add_delivered(message_id, user_id).await
    }

    pub async fn mark_read(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()> {
        // Reading implies the message reached the reader.
        self.store.add_delivered(message_id, user_id).await?;
        self.store.add_read(message_id, user_id).await
    }

    pub async fn receipt_state(&self, message_id: Uuid) -> AppResult<ReceiptState> {
        let message = self
            .store
            .message(message_id)
            .await?
            .ok_or(AppError::NotFound("message"))?;
        let conversation = self
            .store
            .conversation(message.conversation_id)
            .await?
            .ok_or(AppError::NotFound("conversation"))?;

        let seen_by_all = conversation
            .participants
            .iter()
            .filter(|&&p| p != message.sender_id)
            .all(|p| message.read_by.contains(p));

        Ok(ReceiptState {
            message_id,
            is_read: message.is_read(),
            seen_by_all,
            delivered_to: message.delivered_to,
            read_by: message.read_by,
        })
    }
}
