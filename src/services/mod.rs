pub mod conversation_service;
pub mod message_service;
pub mod presence_service;
pub mod reaction_service;
pub mod receipt_service;

pub use conversation_service::ConversationService;
pub use message_service::MessageService;
pub use presence_service::PresenceService;
pub use reaction_service::ReactionService;
pub use receipt_service::{ReceiptService, ReceiptState};
