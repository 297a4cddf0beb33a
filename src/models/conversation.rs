use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::message::MessageKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
}

/// Profile snapshot captured when a participant joins. Stale by design:
/// later profile changes are not re-synced into existing conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Denormalized copy of the newest message, republished on every append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessageSummary {
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub kind: MessageKind,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub kind: ConversationKind,
    pub participants: Vec<Uuid>,
    pub participant_summaries: Vec<ParticipantSummary>,
    /// Per-participant count of messages not yet acknowledged as read.
    pub unread: HashMap<Uuid, u32>,
    /// Ephemeral userId -> last-typing-signal timestamp. Absence means idle.
    #[serde(default)]
    pub typing: HashMap<Uuid, DateTime<Utc>>,
    pub last_message: Option<LastMessageSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}

/// Deterministic identity for a direct conversation: the same unordered user
/// pair always maps to the same id, so the dedup invariant becomes a keyed
/// lookup instead of a scan-then-create race.
pub fn direct_conversation_id(a: Uuid, b: Uuid) -> Uuid {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut name = [0u8; 32];
    name[..16].copy_from_slice(lo.as_bytes());
    name[16..].copy_from_slice(hi.as_bytes());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, &name)
}
