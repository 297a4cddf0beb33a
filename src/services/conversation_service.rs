use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::identity::{IdentityProvider, UserProfile};
use crate::models::conversation::{
    direct_conversation_id, Conversation, ConversationKind, ParticipantSummary,
};
use crate::store::ChatStore;

/// Creates and looks up conversations, and owns the per-participant unread
/// counters.
pub struct ConversationService {
    store: Arc<dyn ChatStore>,
    identity: Arc<dyn IdentityProvider>,
}

fn summary_of(profile: UserProfile) -> ParticipantSummary {
    ParticipantSummary {
        user_id: profile.id,
        display_name: profile.display_name,
        avatar_url: profile.avatar_url,
    }
}

impl ConversationService {
    pub fn new(store: Arc<dyn ChatStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Returns the direct conversation for the unordered pair, creating it on
    /// first use. The id is derived from the pair itself, so concurrent
    /// callers converge on the same conversation instead of racing a
    /// scan-then-create.
    pub async fn get_or_create_direct(&self, user_a: Uuid, user_b: Uuid) -> AppResult<Uuid> {
        if user_a == user_b {
            return Err(AppError::Validation(
                "direct conversation requires two distinct users".into(),
            ));
        }
        let id = direct_conversation_id(user_a, user_b);
        if self.store.conversation(id).await?.is_some() {
            return Ok(id);
        }

        let a = self.identity.profile(user_a).await?;
        let b = self.identity.profile(user_b).await?;
        let now = Utc::now();
        let conversation = Conversation {
            id,
            kind: ConversationKind::Direct,
            participants: vec![user_a, user_b],
            participant_summaries: vec![summary_of(a), summary_of(b)],
            unread: [(user_a, 0), (user_b, 0)].into_iter().collect(),
            typing: HashMap::new(),
            last_message: None,
            created_at: now,
            updated_at: now,
        };
        // A concurrent creator may have won the insert; either way this id
        // is the answer.
        if !self.store.insert_conversation(conversation).await? {
            debug!(conversation_id = %id, "direct conversation already existed");
        }
        Ok(id)
    }

    /// Creates a group conversation. The creator is always a participant;
    /// duplicates in `participant_ids` are dropped.
    pub async fn create_group(
        &self,
        creator_id: Uuid,
        participant_ids: &[Uuid],
    ) -> AppResult<Uuid> {
        let mut members = vec![creator_id];
        for id in participant_ids {
            if !members.contains(id) {
                members.push(*id);
            }
        }

        let mut summaries = Vec::with_capacity(members.len());
        for id in &members {
            let profile = self.identity.profile(*id).await?;
            summaries.push(summary_of(profile));
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            kind: ConversationKind::Group,
            unread: members.iter().map(|id| (*id, 0)).collect(),
            participants: members,
            participant_summaries: summaries,
            typing: HashMap::new(),
            last_message: None,
            created_at: now,
            updated_at: now,
        };
        let id = conversation.id;
        self.store.insert_conversation(conversation).await?;
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Conversation> {
        self.store
            .conversation(id)
            .await?
            .ok_or(AppError::NotFound("conversation"))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        self.store.conversations_for_user(user_id).await
    }

    pub async fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.get(conversation_id).await?.is_participant(user_id))
    }

    /// Bumps every participant's unread counter except the sender's.
    pub async fn increment_unread(&self, conversation_id: Uuid, exclude: Uuid) -> AppResult<()> {
        self.store.increment_unread(conversation_id, exclude, 1).await
    }

    /// Acknowledges the conversation for `user_id`: unread drops to zero.
    pub async fn mark_read(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let conversation = self.get(conversation_id).await?;
        if !conversation.is_participant(user_id) {
            return Err(AppError::Validation(
                "user is not a participant of this conversation".into(),
            ));
        }
        self.store.reset_unread(conversation_id, user_id).await
    }
}
