pub mod conversation;
pub mod message;

pub use conversation::{Conversation, ConversationKind, LastMessageSummary, ParticipantSummary};
pub use message::{Message, MessageKind, TOMBSTONE};
