use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::ChatStore;

/// Sole writer of the per-message emoji -> user-set map.
pub struct ReactionService {
    store: Arc<dyn ChatStore>,
}

impl ReactionService {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Toggles `user_id`'s reaction. Returns true when the reaction is now
    /// present.
    ///
    /// The add and remove paths are per-key atomic in the store, so
    /// concurrent toggles on different emojis never clobber each other. A
    /// concurrent double toggle on the same emoji resolves through
    /// idempotent set operations.
    pub async fn toggle(&self, message_id: Uuid, user_id: Uuid, emoji: &str) -> AppResult<bool> {
        if emoji.is_empty() || emoji.len() > 20 {
            return Err(AppError::Validation("invalid emoji".into()));
        }
        let message = self
            .store
            .message(message_id)
            .await?
            .ok_or(AppError::NotFound("message"))?;
        let present = message
            .reactions
            .get(emoji)
            .map(|set| set.contains(&user_id))
            .unwrap_or(false);

        if present {
            self.store.remove_reaction(message_id, emoji, user_id).await?;
            Ok(false)
        } else {
            self.store.add_reaction(message_id, emoji, user_id).await?;
            Ok(true)
        }
    }

    pub async fn reactions(
        &self,
        message_id: Uuid,
    ) -> AppResult<BTreeMap<String, BTreeSet<Uuid>>> {
        Ok(self
            .store
            .message(message_id)
            .await?
            .ok_or(AppError::NotFound("message"))?
            .reactions)
    }
}
